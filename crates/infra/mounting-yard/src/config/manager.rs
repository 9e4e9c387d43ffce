use super::types::YardConfig;
use crate::error::{Result, YardError};
use crate::utils::paths;
use atomicwrites::{AllowOverwrite, AtomicFile};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_path = paths::get_config_path()?;
        Ok(Self { config_path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn load(&self) -> Result<YardConfig> {
        if !self.config_path.exists() {
            return Err(YardError::ConfigNotFound {
                path: self.config_path.clone(),
            });
        }

        debug!("Loading config from {:?}", self.config_path);
        let contents = fs::read_to_string(&self.config_path)?;
        let config: YardConfig = serde_json::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// Load the config, falling back to defaults when it is missing or broken
    pub fn load_or_default(&self) -> YardConfig {
        match self.load() {
            Ok(config) => config,
            Err(YardError::ConfigNotFound { .. }) => YardConfig::default(),
            Err(e) => {
                warn!("Failed to load config: {}, using default", e);
                YardConfig::default()
            }
        }
    }

    pub fn save(&self, config: &YardConfig) -> Result<()> {
        config.validate()?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Keep the previous version around
        if self.config_path.exists() {
            let backup_path = self.config_path.with_extension("json.bak");
            fs::copy(&self.config_path, backup_path)?;
        }

        debug!("Saving config to {:?}", self.config_path);
        let json = serde_json::to_string_pretty(config)?;

        let af = AtomicFile::new(&self.config_path, AllowOverwrite);
        af.write(|f| f.write_all(json.as_bytes()))
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        info!("Configuration saved successfully");
        Ok(())
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get or create default configuration
    pub fn get_or_create_default(&self) -> Result<YardConfig> {
        if self.config_exists() {
            self.load()
        } else {
            let default_config = YardConfig::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }
}
