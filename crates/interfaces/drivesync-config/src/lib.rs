//! Settings file and runtime limits.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::HashMap;

/// Default number of concurrent downloads. One keeps the strictly sequential
/// transfer order.
pub const DEFAULT_DOWNLOAD_THREADS: usize = 1;

/// Minimum allowed concurrent downloads.
pub const MIN_DOWNLOAD_THREADS: usize = 1;

/// Maximum allowed concurrent downloads.
pub const MAX_DOWNLOAD_THREADS: usize = 8;

/// Page size requested from folder listings.
pub const LIST_PAGE_SIZE: u32 = 1000;

/// Convenience function to clamp a thread value into allowed range.
pub fn clamp_threads(v: usize) -> usize {
    v.clamp(MIN_DOWNLOAD_THREADS, MAX_DOWNLOAD_THREADS)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The JSON settings object.
///
/// ```json
/// {
///   "RootFolder": "C:\\Sync",
///   "RootId": "0AbCd",
///   "Mappings": { "report.csv": "C:\\Data\\out.csv" },
///   "MD5File": "md5.json",
///   "Secret": "client_secret.json",
///   "Token": "token.json",
///   "TargetFile": "upload.zip"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SyncConfig {
    pub root_folder: Utf8PathBuf,
    pub root_id: String,
    #[serde(default)]
    pub mappings: HashMap<String, Utf8PathBuf>,
    #[serde(rename = "MD5File", default)]
    pub md5_file: Option<Utf8PathBuf>,
    /// OAuth client secret; only the external token flow reads it.
    #[serde(default)]
    pub secret: Option<Utf8PathBuf>,
    pub token: Utf8PathBuf,
    #[serde(default)]
    pub target_file: Option<Utf8PathBuf>,
}

impl SyncConfig {
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
