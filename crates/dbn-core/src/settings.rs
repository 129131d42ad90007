//! Connection settings and TOML loading helpers

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{DbnError, Result};

/// Default number of pooled connections, which also bounds the
/// number of interface tasks running at once for the connection
const DEFAULT_MAX_POOL_SIZE: usize = 7;

/// Settings of a database connection that the scheduling layer reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Display name of the connection
    name: String,
    /// Maximum number of pooled connections
    max_pool_size: usize,
}

impl ConnectionSettings {
    /// Create settings with the given display name and the default pool size
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
        }
    }

    /// Set the maximum pool size
    ///
    /// # Panics
    ///
    /// Panics if `max_pool_size` is 0.
    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        assert!(
            max_pool_size > 0,
            "max_pool_size must be greater than 0, got {}",
            max_pool_size
        );
        self.max_pool_size = max_pool_size;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    /// Validate values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.max_pool_size == 0 {
            return Err(DbnError::Configuration(format!(
                "connection '{}': max_pool_size must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new("Connection")
    }
}

/// Parse a settings struct from a TOML document
pub fn from_toml_str<T: DeserializeOwned>(source: &str) -> Result<T> {
    Ok(toml::from_str(source)?)
}

/// Read and parse a settings struct from a TOML file
pub fn from_toml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "loaded settings file");
    from_toml_str(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_connection_settings_defaults() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.name(), "Connection");
        assert_eq!(settings.max_pool_size(), 7);
        assert!(settings.validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "max_pool_size must be greater than 0")]
    fn test_connection_settings_zero_pool() {
        ConnectionSettings::new("dev").with_max_pool_size(0);
    }

    #[test]
    fn test_connection_settings_from_toml() {
        let settings: ConnectionSettings = from_toml_str(
            r#"
            name = "HR"
            max_pool_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings, ConnectionSettings::new("HR").with_max_pool_size(3));
    }

    #[test]
    fn test_connection_settings_partial_toml_uses_defaults() {
        let settings: ConnectionSettings = from_toml_str(r#"name = "Sales""#).unwrap();
        assert_eq!(settings.name(), "Sales");
        assert_eq!(settings.max_pool_size(), 7);
    }

    #[test]
    fn test_zero_pool_size_fails_validation() {
        let settings: ConnectionSettings = from_toml_str("max_pool_size = 0").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(DbnError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result: Result<ConnectionSettings> = from_toml_str("max_pool_size = \"many\"");
        assert!(matches!(result, Err(DbnError::Toml(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"Warehouse\"\nmax_pool_size = 12").unwrap();

        let settings: ConnectionSettings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.max_pool_size(), 12);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result: Result<ConnectionSettings> = from_toml_file("/nonexistent/dbn/settings.toml");
        assert!(matches!(result, Err(DbnError::Io(_))));
    }
}
