use anyhow::{Context as _, Result};
use mounting_yard::{ConfigManager, EndpointStore, YardConfig};
use std::path::PathBuf;
use yard_journal::{JournalWriter, MountRecord};

/// Configuration and persistence shared by every command
pub struct Context {
    pub config: YardConfig,
    pub store: EndpointStore,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, endpoints_dir: Option<PathBuf>) -> Result<Self> {
        let manager = match config_path {
            Some(path) => ConfigManager::with_path(path),
            None => ConfigManager::new()?,
        };
        let mut config = manager.load_or_default();
        if let Some(dir) = endpoints_dir {
            config.endpoints_dir = dir;
        }

        let dir = config
            .endpoints_dir()
            .context("Could not resolve the endpoints directory")?;
        Ok(Self {
            config,
            store: EndpointStore::new(dir),
        })
    }

    pub fn journal(&self) -> Result<JournalWriter> {
        Ok(JournalWriter::new(self.config.journal_dir()?))
    }
}

/// Append to the journal, logging instead of failing the command
pub fn record(journal: &JournalWriter, record: &MountRecord) {
    if let Err(e) = journal.append(record) {
        tracing::warn!("Failed to write mount journal: {}", e);
    }
}
