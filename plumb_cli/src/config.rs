//! CLI configuration file.
//!
//! ```toml
//! dataset = "data/custom"
//!
//! [settings]
//! stream = "hot"
//! velocity_mode = "closed_form_pipe_flow"
//! hot_water_temp_c = 65.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use plumb_core::{CalcError, CalcResult, GlobalSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory with custom reference tables
    pub dataset: Option<PathBuf>,

    pub settings: GlobalSettings,
}

impl Config {
    /// Read `path` when given, otherwise use the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> CalcResult<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let content = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CalcError::serialization(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plumb_core::{Stream, VelocityMode};

    #[test]
    fn test_default_without_path() {
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("[settings]\nstream = \"hot\"\n").unwrap();
        assert_eq!(config.settings.stream, Stream::Hot);
        assert_eq!(config.settings.velocity_mode, VelocityMode::TableInterpolation);
        assert!(config.dataset.is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load_or_default(Some(Path::new("/nonexistent/plumb.toml"))).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
