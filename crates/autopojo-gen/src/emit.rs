//! Writing rendered compilation units to storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::names::ResolvedName;

/// A rendered top-level class, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub name: ResolvedName,
    /// Path relative to the output root.
    pub path: PathBuf,
    pub source: String,
}

/// Errors from emitting a unit.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("`{0}` is nested and cannot be emitted on its own")]
    NotTopLevel(String),
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for generated sources. Called concurrently from round workers.
pub trait Emitter: Sync {
    fn emit(&self, unit: &CompilationUnit) -> Result<(), EmitError>;
}

fn ensure_top_level(unit: &CompilationUnit) -> Result<(), EmitError> {
    if unit.name.is_top_level() {
        Ok(())
    } else {
        Err(EmitError::NotTopLevel(unit.name.qualified()))
    }
}

/// Writes each unit to `<root>/<package path>/<Name>.java`.
#[derive(Debug, Clone)]
pub struct FsEmitter {
    root: PathBuf,
}

impl FsEmitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Emitter for FsEmitter {
    fn emit(&self, unit: &CompilationUnit) -> Result<(), EmitError> {
        ensure_top_level(unit)?;
        let path = self.root.join(&unit.path);
        let io_err = |source: std::io::Error| EmitError::Io {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        fs::write(&path, &unit.source).map_err(io_err)?;
        tracing::debug!(path = %path.display(), "wrote generated source");
        Ok(())
    }
}

/// Keeps emitted units in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    units: Mutex<Vec<CompilationUnit>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the units emitted so far.
    pub fn units(&self) -> Vec<CompilationUnit> {
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Find an emitted unit by qualified class name.
    pub fn get(&self, qualified_name: &str) -> Option<CompilationUnit> {
        self.units().into_iter().find(|u| u.name.qualified() == qualified_name)
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&self, unit: &CompilationUnit) -> Result<(), EmitError> {
        ensure_top_level(unit)?;
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(unit.clone());
        Ok(())
    }
}
