use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::StorageError;

/// Remote file id → checksum of the content last written locally.
///
/// An entry is only ever set after the file's bytes are on disk, so a
/// present entry always describes a complete download. Keys are kept
/// sorted so persisted manifests are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumStore {
    entries: BTreeMap<String, String>,
}

impl ChecksumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a manifest. An absent file means "nothing synced yet" and yields
    /// an empty store.
    pub fn load(path: &Utf8Path) -> Result<Self, StorageError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No checksum manifest at {path}, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let entries = serde_json::from_str(&data).map_err(|source| StorageError::Corrupt {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self { entries })
    }

    /// Replace the manifest at `path` with the full current mapping.
    ///
    /// Written to a sibling temp file first and renamed over the old one, so
    /// the previous manifest survives a failed write.
    pub fn persist(&self, path: &Utf8Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        let data = serde_json::to_string(&self.entries)?;
        std::fs::write(&tmp, data)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StorageError::Io(e));
        }
        tracing::debug!("Saved {} checksums to {path}", self.entries.len());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn set(&mut self, id: impl Into<String>, checksum: impl Into<String>) {
        self.entries.insert(id.into(), checksum.into());
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
