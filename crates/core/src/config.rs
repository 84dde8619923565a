//! Configuration via `fieldex.toml`
//!
//! Every setting has a default, so an empty file (or no file) is a valid
//! configuration. Values are validated eagerly on load.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "fieldex.toml";

/// Default number of documents per sampled lookup before a sort switches to
/// whole-segment materialization (0.2%).
pub const DEFAULT_SAMPLE_RATIO: u32 = 500;

/// Default cap on the initial slot allocation of a sort comparator.
pub const DEFAULT_INITIAL_SLOT_CAPACITY: usize = 256;

/// Sort comparator settings (`[sort]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortConfig {
    /// Per-segment threshold is `max_doc / sample_ratio`
    #[serde(default = "default_sample_ratio")]
    pub sample_ratio: u32,
    /// Initial slot allocation is `min(num_hits, initial_slot_capacity)`
    #[serde(default = "default_initial_slot_capacity")]
    pub initial_slot_capacity: usize,
}

fn default_sample_ratio() -> u32 {
    DEFAULT_SAMPLE_RATIO
}

fn default_initial_slot_capacity() -> usize {
    DEFAULT_INITIAL_SLOT_CAPACITY
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            sample_ratio: default_sample_ratio(),
            initial_slot_capacity: default_initial_slot_capacity(),
        }
    }
}

/// Search handler manager settings (`[handlers]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Cache permission-filtered clause handler lookups per (user, clause)
    #[serde(default = "default_true")]
    pub cache_permission_lookups: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            cache_permission_lookups: true,
        }
    }
}

/// Configuration loaded from `fieldex.toml`.
///
/// # Example
///
/// ```toml
/// [sort]
/// sample_ratio = 500
/// initial_slot_capacity = 256
///
/// [handlers]
/// cache_permission_lookups = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldexConfig {
    /// Sort settings
    #[serde(default)]
    pub sort: SortConfig,
    /// Handler manager settings
    #[serde(default)]
    pub handlers: HandlerConfig,
}

impl FieldexConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_ratio` or `initial_slot_capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.sort.sample_ratio == 0 {
            return Err(Error::invalid_input(
                "sort.sample_ratio must be greater than zero",
            ));
        }
        if self.sort.initial_slot_capacity == 0 {
            return Err(Error::invalid_input(
                "sort.initial_slot_capacity must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# fieldex configuration

[sort]
# A sort resolves values one stored document at a time until it has made
# max_doc / sample_ratio lookups in a segment, then loads the whole field.
sample_ratio = 500

# Initial number of result slots allocated by a sort comparator. Grows
# geometrically up to the requested hit count.
initial_slot_capacity = 256

[handlers]
# Cache permission-filtered clause handlers per (user, clause name) until the
# next refresh.
cache_permission_lookups = true
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FieldexConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_input(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidInput(msg) => {
                Error::invalid_input(format!("{} (in '{}')", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_input(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = FieldexConfig::default();
        assert_eq!(config.sort.sample_ratio, 500);
        assert_eq!(config.sort.initial_slot_capacity, 256);
        assert!(config.handlers.cache_permission_lookups);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_parses_to_default() {
        let config = FieldexConfig::from_toml_str(FieldexConfig::default_toml()).unwrap();
        assert_eq!(config, FieldexConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FieldexConfig::from_toml_str("").unwrap();
        assert_eq!(config, FieldexConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config = FieldexConfig::from_toml_str("[sort]\nsample_ratio = 100\n").unwrap();
        assert_eq!(config.sort.sample_ratio, 100);
        assert_eq!(config.sort.initial_slot_capacity, 256);
    }

    #[test]
    fn test_zero_ratio_rejected() {
        let err = FieldexConfig::from_toml_str("[sort]\nsample_ratio = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        FieldexConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(FieldexConfig::from_file(&path).unwrap(), FieldexConfig::default());
    }

    #[test]
    fn test_write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[handlers]\ncache_permission_lookups = false\n").unwrap();

        FieldexConfig::write_default_if_missing(&path).unwrap();

        let config = FieldexConfig::from_file(&path).unwrap();
        assert!(!config.handlers.cache_permission_lookups);
    }

    #[test]
    fn test_write_to_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = FieldexConfig::default();
        config.sort.initial_slot_capacity = 64;
        config.write_to_file(&path).unwrap();

        assert_eq!(FieldexConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[sort]\nsample_ratio = \"many\"\n").unwrap();

        let msg = FieldexConfig::from_file(&path).unwrap_err().to_string();
        assert!(msg.contains(CONFIG_FILE_NAME));
    }
}
