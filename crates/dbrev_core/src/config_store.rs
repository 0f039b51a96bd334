use crate::{DbError, ReverseEngineeringConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON file holding the reverse-engineering filter configuration.
pub struct ReverseEngineeringConfigStore {
    path: PathBuf,
}

impl ReverseEngineeringConfigStore {
    /// Store in the user config directory (`<config_dir>/dbrev`).
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new() -> Result<Self, DbError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DbError::IoError(std::io::Error::other("Could not find config directory"))
        })?;

        let app_dir = config_dir.join("dbrev");
        fs::create_dir_all(&app_dir).map_err(DbError::IoError)?;

        Ok(Self {
            path: app_dir.join("reverse_engineering.json"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the configuration.
    ///
    /// Returns the default configuration if the file doesn't exist. Malformed
    /// JSON and invalid table patterns are rejected.
    pub fn load(&self) -> Result<ReverseEngineeringConfig, DbError> {
        if !self.path.exists() {
            log::debug!(
                "No reverse engineering config at {}, using defaults",
                self.path.display()
            );
            return Ok(ReverseEngineeringConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(DbError::IoError)?;
        let config: ReverseEngineeringConfig = serde_json::from_str(&content)
            .map_err(|e| DbError::InvalidConfig(format!("{}: {}", self.path.display(), e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, config: &ReverseEngineeringConfig) -> Result<(), DbError> {
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| DbError::InvalidConfig(e.to_string()))?;

        fs::write(&self.path, content).map_err(DbError::IoError)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
