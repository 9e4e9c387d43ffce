use crate::error::{Result, YardError};
use crate::mount::{OrchestratorSettings, SchemeDispatcher};
use crate::platform::common::{DEFAULT_NATIVE_SCHEMES, MOUNT_TIMEOUT};
use crate::utils::paths::{expand_path, get_default_journal_dir};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YardConfig {
    pub version: String,

    /// Where `<name>.mountingYard` files live. `~` is expanded.
    pub endpoints_dir: PathBuf,

    /// Shared directory for native mounts; `<endpoints_dir>/mounts` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_dir: Option<PathBuf>,

    /// Schemes mounted natively; everything else goes to the desktop opener
    pub native_schemes: Vec<String>,

    pub mount_timeout_secs: u64,

    /// Mount journal location; `~/.mounting-yard/journal` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_dir: Option<PathBuf>,
}

impl Default for YardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            endpoints_dir: default_endpoints_dir(),
            mount_dir: None,
            native_schemes: DEFAULT_NATIVE_SCHEMES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            mount_timeout_secs: MOUNT_TIMEOUT.as_secs(),
            journal_dir: None,
        }
    }
}

fn default_endpoints_dir() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("~/Documents"))
        .join("Mounting Yard")
}

impl YardConfig {
    pub fn endpoints_dir(&self) -> Result<PathBuf> {
        Ok(expand_path(&self.endpoints_dir)?)
    }

    pub fn mount_dir(&self) -> Result<PathBuf> {
        match &self.mount_dir {
            Some(dir) => Ok(expand_path(dir)?),
            None => Ok(self.endpoints_dir()?.join("mounts")),
        }
    }

    pub fn journal_dir(&self) -> Result<PathBuf> {
        let dir = match &self.journal_dir {
            Some(dir) => expand_path(dir)?,
            None => get_default_journal_dir()?,
        };
        Ok(dir)
    }

    pub fn mount_timeout(&self) -> Duration {
        Duration::from_secs(self.mount_timeout_secs)
    }

    pub fn orchestrator_settings(&self) -> Result<OrchestratorSettings> {
        Ok(OrchestratorSettings {
            dispatcher: SchemeDispatcher::new(&self.native_schemes),
            mount_dir: self.mount_dir()?,
            mount_timeout: self.mount_timeout(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints_dir.as_os_str().is_empty() {
            return Err(YardError::ConfigInvalid {
                message: "endpoints_dir cannot be empty".to_string(),
            });
        }

        if self.mount_timeout_secs == 0 {
            return Err(YardError::ConfigInvalid {
                message: "mount_timeout_secs must be greater than zero".to_string(),
            });
        }

        for scheme in &self.native_schemes {
            let valid = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !valid {
                return Err(YardError::ConfigInvalid {
                    message: format!("'{scheme}' is not a valid URI scheme"),
                });
            }
        }

        Ok(())
    }
}
