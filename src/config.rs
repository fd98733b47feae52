use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_WIN_LENGTH};

/// Largest board accepted, in cells, so canonical keys stay bounded
pub const MAX_CELLS: usize = 1024;

/// Board dimensions and engine strength, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    pub win_length: usize,
    /// Search depth of the engine when it plays a human
    pub depth_vs_human: usize,
    /// Search depth of both engines in engine-vs-engine games
    pub depth_vs_ai: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            win_length: DEFAULT_WIN_LENGTH,
            depth_vs_human: 3,
            depth_vs_ai: 2,
        }
    }
}

impl EngineConfig {
    /// Reads and validates the TOML file at `path`; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file gives the default config
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("no config at {}, using the defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::Invalid(
                "rows and cols must be > 0".into(),
            ));
        }
        if self.rows * self.cols > MAX_CELLS {
            return Err(ConfigError::Invalid(format!(
                "board has {} cells, at most {} are supported",
                self.rows * self.cols,
                MAX_CELLS
            )));
        }
        if self.win_length < 2 {
            return Err(ConfigError::Invalid(
                "win_length must be >= 2".into(),
            ));
        }
        if self.win_length > self.rows.max(self.cols) {
            return Err(ConfigError::Invalid(format!(
                "win_length {} does not fit on a {}x{} board",
                self.win_length, self.rows, self.cols
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.rows, config.cols, config.win_length), (9, 9, 4));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str("rows = 6\ncols = 7").unwrap();
        assert_eq!(config.rows, 6);
        assert_eq!(config.cols, 7);
        assert_eq!(config.win_length, 4);
        assert_eq!(config.depth_vs_ai, 2);
    }

    #[test]
    fn rejects_bad_dimensions() {
        let config = EngineConfig {
            win_length: 10,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig {
            rows: 40,
            cols: 40,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            cols: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let config = EngineConfig::load_or_default(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
