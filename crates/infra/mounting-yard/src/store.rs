use crate::endpoint::{Credentials, Endpoint, EndpointSet};
use crate::error::Result;
use crate::platform::common::{ENDPOINT_EXTENSION, EXPORT_EXTENSION};
use crate::utils::paths::{ensure_dir, sanitize_file_name};
use anyhow::Context;
use atomicwrites::{AllowOverwrite, AtomicFile};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const GUEST_FLAG: &str = "yes";

/// On-disk form of one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    pub address: String,

    #[serde(default)]
    pub username: String,

    /// Present (written as `"yes"`) when connecting as guest. Any value counts.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub guest: Option<Value>,

    /// Last known mount point. Advisory only; re-validated before use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mounted_point: Option<PathBuf>,
}

impl EndpointRecord {
    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        let credentials = endpoint.credentials();
        Self {
            address: endpoint.address().to_string(),
            username: credentials.username.clone().unwrap_or_default(),
            guest: credentials.guest.then(|| Value::from(GUEST_FLAG)),
            mounted_point: endpoint.state().mounted_path().map(Path::to_path_buf),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: Some(self.username.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            guest: self.guest.is_some(),
        }
    }
}

/// Keep a key that is present even when its value is `null`
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Persists endpoints as one `<name>.mountingYard` JSON file each
pub struct EndpointStore {
    dir: PathBuf,
    /// File stems this store has loaded or written
    known: BTreeSet<String>,
}

impl EndpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            known: BTreeSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{ENDPOINT_EXTENSION}"))
    }

    /// Read every endpoint file in the directory. Unreadable files are skipped.
    pub fn load(&mut self) -> Result<EndpointSet> {
        let mut set = EndpointSet::new();
        if !self.dir.exists() {
            debug!("Endpoint directory {} does not exist yet", self.dir.display());
            return Ok(set);
        }

        let pattern = format!(
            "{}/*.{ENDPOINT_EXTENSION}",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );
        let paths = glob::glob(&pattern).context("Invalid endpoint directory pattern")?;

        for path in paths.filter_map(std::result::Result::ok) {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let record = match read_record(&path) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping {}: {:#}", path.display(), e);
                    continue;
                }
            };

            let id = match set.insert(name, record.address.clone(), record.credentials()) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if let Some(endpoint) = set.get_mut(id) {
                if let Some(point) = record.mounted_point {
                    endpoint.restore_mount_point(point);
                }
                endpoint.mark_saved();
            }
            self.known.insert(name.to_string());
        }

        info!("Loaded {} endpoints from {}", set.len(), self.dir.display());
        Ok(set)
    }

    /// Write modified endpoints and delete files of removed or renamed ones.
    /// Returns the number of files written.
    pub fn save(&mut self, set: &mut EndpointSet) -> Result<usize> {
        ensure_dir(&self.dir)?;

        let current: BTreeSet<String> = set.iter().map(|e| sanitize_file_name(e.name())).collect();
        for stale in self.known.difference(&current) {
            let path = self.file_for(stale);
            if path.exists() {
                debug!("Removing {}", path.display());
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }

        let mut written = 0;
        for endpoint in set.iter_mut() {
            let stem = sanitize_file_name(endpoint.name());
            let path = self.file_for(&stem);
            if !endpoint.is_modified() && path.exists() {
                continue;
            }

            let json = serde_json::to_string_pretty(&EndpointRecord::from_endpoint(endpoint))?;
            write_atomic(&path, json.as_bytes())?;
            endpoint.mark_saved();
            written += 1;
        }

        self.known = current;
        debug!("Saved {} endpoint files", written);
        Ok(written)
    }

    /// Write every endpoint into one `{name: record}` document
    pub fn export(set: &EndpointSet, path: &Path) -> Result<usize> {
        let records: BTreeMap<String, EndpointRecord> = set
            .iter()
            .map(|e| {
                let mut record = EndpointRecord::from_endpoint(e);
                record.mounted_point = None;
                (e.name().to_string(), record)
            })
            .collect();

        let path = with_export_extension(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        write_atomic(&path, serde_json::to_string_pretty(&records)?.as_bytes())?;

        info!("Exported {} endpoints to {}", records.len(), path.display());
        Ok(records.len())
    }

    /// Merge an export document into `set`. Names already present are left
    /// untouched. Returns the number of endpoints added.
    pub fn import(set: &mut EndpointSet, path: &Path) -> Result<usize> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let records: BTreeMap<String, EndpointRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not an endpoint export", path.display()))?;

        let mut imported = 0;
        for (name, record) in records {
            if set.id_of(&name).is_some() {
                debug!("Keeping existing endpoint '{}'", name);
                continue;
            }
            let credentials = record.credentials();
            match set.insert(name.as_str(), record.address, credentials) {
                Ok(_) => imported += 1,
                Err(e) => warn!("Skipping '{}': {}", name, e),
            }
        }

        info!("Imported {} endpoints from {}", imported, path.display());
        Ok(imported)
    }
}

fn read_record(path: &Path) -> anyhow::Result<EndpointRecord> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let af = AtomicFile::new(path, AllowOverwrite);
    af.write(|f| f.write_all(bytes))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn with_export_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(EXPORT_EXTENSION)
    }
}
