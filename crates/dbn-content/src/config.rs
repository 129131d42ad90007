//! Dynamic content configuration

use std::path::Path;

use dbn_core::Result;
use serde::{Deserialize, Serialize};

/// Settings shared by dynamic content instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Dispose replaced elements on a worker thread instead of inline
    pub dispose_in_background: bool,
}

impl ContentConfig {
    pub fn with_dispose_in_background(mut self, enabled: bool) -> Self {
        self.dispose_in_background = enabled;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        dbn_core::from_toml_str(source)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        dbn_core::from_toml_file(path)
    }
}

impl Default for ContentConfig {
    /// Defaults:
    /// - dispose_in_background: true
    fn default() -> Self {
        Self {
            dispose_in_background: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_disposes_in_background() {
        assert!(ContentConfig::default().dispose_in_background);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ContentConfig::from_toml_str("").unwrap();
        assert_eq!(config, ContentConfig::default());

        let config = ContentConfig::from_toml_str("dispose_in_background = false").unwrap();
        assert!(!config.dispose_in_background);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dispose_in_background = false").unwrap();

        let config = ContentConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config, ContentConfig::default().with_dispose_in_background(false));
    }
}
