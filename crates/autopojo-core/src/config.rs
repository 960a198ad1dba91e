//! Configuration for naming, output, and execution of a generation round.
//!
//! Load order: `.autopojo/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default reserved suffix toggled by default naming.
pub const DEFAULT_SUFFIX: &str = "POJO";

/// Default generator identity written into `@Generated`.
pub const DEFAULT_GENERATOR_ID: &str = "autopojo";

/// Top-level autopojo configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub naming: NamingConfig,
    pub output: OutputConfig,
    pub execution: ExecutionConfig,
}

/// Naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Suffix stripped from (or appended to) marked top-level names.
    pub suffix: String,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated sources are written under, relative to the project root.
    pub dir: PathBuf,
    /// Identity string recorded in the `@Generated` annotation.
    pub generator_id: String,
    /// Also record the generation timestamp in `@Generated`.
    /// Off by default so output is reproducible.
    pub emit_date: bool,
}

/// Execution configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Worker threads for a round. 0 uses the global rayon pool.
    pub threads: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("generated"),
            generator_id: DEFAULT_GENERATOR_ID.to_string(),
            emit_date: false,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl GeneratorConfig {
    /// Load config from `.autopojo/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".autopojo").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("AUTOPOJO_SUFFIX", &mut config.naming.suffix);
        env_override("AUTOPOJO_THREADS", &mut config.execution.threads);
        env_override("AUTOPOJO_OUT_DIR", &mut config.output.dir);
        env_override("AUTOPOJO_GENERATOR_ID", &mut config.output.generator_id);

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make naming or output ambiguous.
    pub fn validate(&self) -> Result<()> {
        if self.naming.suffix.trim().is_empty() {
            anyhow::bail!("naming.suffix must not be blank");
        }
        if self.output.generator_id.trim().is_empty() {
            anyhow::bail!("output.generator_id must not be blank");
        }
        Ok(())
    }

    /// Output directory resolved against the project root.
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.naming.suffix, "POJO");
        assert_eq!(config.output.dir, PathBuf::from("generated"));
        assert_eq!(config.output.generator_id, "autopojo");
        assert!(!config.output.emit_date);
        assert_eq!(config.execution.threads, 0);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[naming]
suffix = "Dto"

[execution]
threads = 4
"#;
        let config: GeneratorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.naming.suffix, "Dto");
        assert_eq!(config.execution.threads, 4);
        // Defaults for unspecified fields
        assert_eq!(config.output.generator_id, "autopojo");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = GeneratorConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.naming.suffix, "POJO");
    }

    #[test]
    fn test_load_rejects_blank_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".autopojo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[naming]\nsuffix = \"  \"\n").unwrap();

        let err = GeneratorConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("suffix"));
    }

    #[test]
    fn test_output_dir_is_relative_to_root() {
        let config = GeneratorConfig::default();
        assert_eq!(
            config.output_dir(Path::new("/work")),
            PathBuf::from("/work/generated")
        );
    }
}
