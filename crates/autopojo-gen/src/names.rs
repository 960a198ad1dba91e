//! Generated-name resolution.
//!
//! A marked top-level interface `pkg.FooPOJO` becomes `pkg.Foo` (and `pkg.Foo`
//! becomes `pkg.FooPOJO`) unless the marker names the class explicitly.
//! Nested declarations are qualified under their parent's generated name and
//! keep their own simple name.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use autopojo_core::config::DEFAULT_SUFFIX;
use autopojo_core::model::{Declaration, Marker};
use autopojo_core::repository::DeclarationRepository;
use serde::Serialize;

use crate::error::GenError;

/// Fully qualified name of a generated class: a package plus one simple name
/// per nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedName {
    package: String,
    simple_names: Vec<String>,
}

impl ResolvedName {
    pub fn top_level(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            simple_names: vec![name.into()],
        }
    }

    /// A class nested directly inside this one.
    #[must_use]
    pub fn nested(&self, name: impl Into<String>) -> Self {
        let mut simple_names = self.simple_names.clone();
        simple_names.push(name.into());
        Self {
            package: self.package.clone(),
            simple_names,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn simple_names(&self) -> &[String] {
        &self.simple_names
    }

    /// Innermost simple name.
    pub fn simple_name(&self) -> &str {
        self.simple_names.last().map_or("", String::as_str)
    }

    /// Name of the enclosing generated class, `None` for top-level classes.
    pub fn enclosing(&self) -> Option<ResolvedName> {
        if self.is_top_level() {
            return None;
        }
        Some(Self {
            package: self.package.clone(),
            simple_names: self.simple_names[..self.simple_names.len() - 1].to_vec(),
        })
    }

    pub fn is_top_level(&self) -> bool {
        self.simple_names.len() <= 1
    }

    /// Dotted form, e.g. `pkg.User.Address`.
    pub fn qualified(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            write!(f, "{}.", self.package)?;
        }
        f.write_str(&self.simple_names.join("."))
    }
}

/// Computes generated names against a repository, caching results for the
/// lifetime of one round. Safe to share across worker threads.
#[derive(Debug)]
pub struct NameResolver<'r> {
    repo: &'r DeclarationRepository,
    suffix: String,
    cache: RwLock<HashMap<(String, bool), Option<ResolvedName>>>,
}

impl<'r> NameResolver<'r> {
    pub fn new(repo: &'r DeclarationRepository) -> Self {
        Self::with_suffix(repo, DEFAULT_SUFFIX)
    }

    pub fn with_suffix(repo: &'r DeclarationRepository, suffix: impl Into<String>) -> Self {
        Self {
            repo,
            suffix: suffix.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &'r DeclarationRepository {
        self.repo
    }

    /// Resolve the generated name of `decl`.
    ///
    /// `Ok(None)` means "not one of ours" and is only returned when `strict` is
    /// false or `decl` is `None`. With `strict`, a declaration that has neither
    /// a marker nor a resolvable parent fails with [`GenError::MissingMarker`],
    /// and so does any such ancestor.
    pub fn resolve(
        &self,
        decl: Option<&Declaration>,
        strict: bool,
    ) -> Result<Option<ResolvedName>, GenError> {
        let Some(decl) = decl else {
            return Ok(None);
        };

        let key = (decl.qualified_name(), strict);
        if let Ok(cache) = self.cache.read()
            && let Some(hit) = cache.get(&key)
        {
            return Ok(hit.clone());
        }

        let resolved = self.compute(decl, strict)?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, resolved.clone());
        }
        Ok(resolved)
    }

    /// Strict resolution for a declaration that must be generated.
    pub fn resolve_strict(&self, decl: &Declaration) -> Result<ResolvedName, GenError> {
        self.resolve(Some(decl), true)?
            .ok_or_else(|| GenError::MissingMarker(decl.qualified_name()))
    }

    /// Lenient resolution: `None` for anything that is not generated.
    pub fn resolve_lenient(&self, decl: &Declaration) -> Option<ResolvedName> {
        // Non-strict `compute` has no error path; treat one as pass-through.
        self.resolve(Some(decl), false).ok().flatten()
    }

    fn compute(&self, decl: &Declaration, strict: bool) -> Result<Option<ResolvedName>, GenError> {
        let parent = match self.repo.enclosing_of(decl) {
            Some(enclosing) => self.resolve(Some(enclosing), strict)?,
            None => None,
        };

        let marker = self.repo.marker_of(decl);
        if marker.is_none() && parent.is_none() {
            if strict {
                return Err(GenError::MissingMarker(decl.qualified_name()));
            }
            return Ok(None);
        }

        let local = match marker.as_ref().and_then(Marker::explicit_name) {
            Some(explicit) => explicit.to_string(),
            None => self.default_name(&decl.name, parent.is_none() && marker.is_some()),
        };

        let resolved = match parent {
            Some(parent) => parent.nested(local),
            None => ResolvedName::top_level(decl.package.clone(), local),
        };
        tracing::trace!(source = %decl.qualified_name(), generated = %resolved, "resolved name");
        Ok(Some(resolved))
    }

    /// Toggle the suffix on marked top-level names; keep everything else.
    fn default_name(&self, simple_name: &str, toggle_suffix: bool) -> String {
        if !toggle_suffix {
            return simple_name.to_string();
        }
        match simple_name.strip_suffix(self.suffix.as_str()) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => format!("{}{}", simple_name, self.suffix),
        }
    }
}
