//! YAML configuration for `lsmon-report`.
//!
//! ```yaml
//! dialect: auto
//! log_level: warn
//! featured_products:
//!   - SAP
//!   - Safe
//! catalog:
//!   RVT: Revit
//!   MYCODE: My Product
//! ```
//!
//! Every field is optional.

use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use license_monitor_core::ProductCatalog;
use license_monitor_parser::Dialect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Products shown when no `featured_products` list is configured.
pub const DEFAULT_FEATURED_PRODUCTS: &[&str] = &[
    "Safe",
    "EtabNL",
    "EtabPL",
    "SAPPL",
    "SAP",
    "T.TD.User",
    "T.SD.Design.U",
    "CSC.FT.CON.All",
    "CSIxR",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Dialect selection, including automatic detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DialectChoice {
    #[default]
    Auto,
    Simple,
    Verbose,
}

impl DialectChoice {
    /// The fixed dialect, or `None` to detect it per dump.
    pub fn dialect(self) -> Option<Dialect> {
        match self {
            Self::Auto => None,
            Self::Simple => Some(Dialect::Simple),
            Self::Verbose => Some(Dialect::Verbose),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub dialect: DialectChoice,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Name fragments of the products shown unless `--all` is given.
    pub featured_products: Vec<String>,
    /// Product code overrides layered on the built-in catalog.
    pub catalog: BTreeMap<String, String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            dialect: DialectChoice::Auto,
            log_level: "warn".to_string(),
            featured_products: DEFAULT_FEATURED_PRODUCTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            catalog: BTreeMap::new(),
        }
    }
}

impl MonitorConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Built-in catalog with the configured overrides applied.
    pub fn catalog(&self) -> ProductCatalog {
        ProductCatalog::builtin().with_overrides(
            self.catalog
                .iter()
                .map(|(code, name)| (code.as_str(), name.as_str())),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.dialect, DialectChoice::Auto);
        assert_eq!(config.log_level, "warn");
        assert!(config.featured_products.iter().any(|name| name == "SAP"));
        assert_eq!(config.catalog().resolve("RVT"), "Revit");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config("dialect: verbose\ncatalog:\n  RVT: Revit Architecture\n  MYCODE: My Product\n");
        let config = MonitorConfig::load(file.path()).unwrap();

        assert_eq!(config.dialect.dialect(), Some(Dialect::Verbose));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.featured_products.len(), DEFAULT_FEATURED_PRODUCTS.len());

        let catalog = config.catalog();
        assert_eq!(catalog.resolve("RVT"), "Revit Architecture");
        assert_eq!(catalog.resolve("MYCODE"), "My Product");
        assert_eq!(catalog.resolve("ACD"), "AutoCAD");
    }

    #[test]
    fn test_empty_featured_list_is_kept() {
        let file = write_config("featured_products: []\n");
        let config = MonitorConfig::load(file.path()).unwrap();
        assert!(config.featured_products.is_empty());
    }

    #[test]
    fn test_errors_name_the_file() {
        let err = MonitorConfig::load("/nonexistent/lsmon.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/lsmon.yaml"));

        let file = write_config("dialect: sideways\n");
        let err = MonitorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = MonitorConfig::load_or_default(None).unwrap();
        assert_eq!(config.dialect, DialectChoice::Auto);
    }
}
