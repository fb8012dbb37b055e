use camino::Utf8PathBuf;
use drivesync_core::PathOverrides;
use drivesync_infra::net::TransferError;
use drivesync_infra::AccessToken;
use drivesync_persistence::{ChecksumStore, StorageError};
use serde::{Deserialize, Serialize};

pub mod crawl;
pub mod download;
pub mod engine;
pub mod paths;
pub mod remote;
pub mod session;
pub mod upload;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Concurrent downloads. `1` is the reference strictly sequential order.
    pub max_threads: usize,
    pub rate_limit_bytes: Option<u64>,
    /// Hash downloaded bytes and reject the file when they do not match the
    /// remote checksum.
    pub verify_checksums: bool,
    /// Persist the manifest after every N successful downloads in addition
    /// to the final write.
    pub checkpoint_every: Option<usize>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_threads: drivesync_config::DEFAULT_DOWNLOAD_THREADS,
            rate_limit_bytes: None,
            verify_checksums: false,
            checkpoint_every: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub root_folder: Utf8PathBuf,
    pub root_id: String,
    pub overrides: PathOverrides,
    /// Where the checksum manifest lives. Without one every run starts from
    /// an empty manifest and nothing is persisted.
    pub manifest_path: Option<Utf8PathBuf>,
    pub options: SyncOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub folders_visited: u64,
    pub listing_failures: u64,
    pub files_seen: u64,
    pub files_unchanged: u64,
    pub files_unhashed: u64,
    pub files_queued: u64,
    pub files_downloaded: u64,
    pub files_failed: u64,
    pub bytes_downloaded: u64,
}

#[derive(Debug)]
pub struct SyncResult {
    pub report: SyncReport,
    /// Per-item problems that were logged and skipped.
    pub failures: Vec<SyncError>,
    pub checksums: ChecksumStore,
}

/// High-level error type for sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("listing folder {folder_id} failed: {source}")]
    Listing {
        folder_id: String,
        #[source]
        source: remote::RemoteError,
    },
    #[error("fetching file {file_id} failed: {source}")]
    Fetch {
        file_id: String,
        #[source]
        source: remote::RemoteError,
    },
    #[error("writing {path} failed: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: TransferError,
    },
    #[error("uploading {path} failed: {source}")]
    RemoteWrite {
        path: Utf8PathBuf,
        #[source]
        source: remote::RemoteError,
    },
    #[error("local io error on {path}: {source}")]
    Local {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a file path: {0}")]
    InvalidPath(Utf8PathBuf),
    #[error("checksum manifest: {0}")]
    Manifest(#[from] StorageError),
}

impl SyncError {
    /// Per-item failures the run logs and moves past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Listing { .. }
                | SyncError::Fetch { .. }
                | SyncError::Write { .. }
                | SyncError::Local { .. }
        )
    }
}

pub use engine::SyncEngine;
pub use session::SyncSession;

/// Convenience constructor for the default engine.
pub fn default_engine(client: reqwest::Client, token: AccessToken) -> SyncEngine {
    SyncEngine::new(client, token)
}
