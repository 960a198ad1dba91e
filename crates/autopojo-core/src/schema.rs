//! Declaration manifest: the JSON hand-off from discovery to generation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::Declaration;
use crate::repository::DeclarationRepository;

const CURRENT_VERSION: &str = "1.0.0";

/// Declarations found by discovery, in discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl Manifest {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            declarations,
        }
    }

    /// Index the declarations for a round.
    pub fn into_repository(self) -> Result<DeclarationRepository> {
        DeclarationRepository::new(self.declarations).context("invalid declaration manifest")
    }
}

/// Validate a manifest's schema version.
pub fn validate_version(manifest: &Manifest) -> Result<()> {
    if manifest.version != CURRENT_VERSION {
        anyhow::bail!(
            "manifest version mismatch: expected {}, found {}",
            CURRENT_VERSION,
            manifest.version
        );
    }
    Ok(())
}

/// Serialize a manifest to a pretty-printed JSON string.
pub fn to_json(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize manifest to JSON")
}

/// Deserialize a manifest from a JSON string.
pub fn from_json(json: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest from JSON")?;
    validate_version(&manifest)?;
    Ok(manifest)
}

/// Read a manifest file from disk.
pub fn load(path: &Path) -> Result<Manifest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest from {}", path.display()))?;
    from_json(&json)
}
