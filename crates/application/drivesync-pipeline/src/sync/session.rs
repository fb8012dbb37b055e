use std::collections::VecDeque;

use drivesync_core::{FileTask, FolderTask};
use drivesync_persistence::ChecksumStore;

use crate::sync::{SyncError, SyncReport};

/// All mutable state of one sync run. Owned by the engine and lent to the
/// crawler and the download pipeline in turn.
#[derive(Debug, Default)]
pub struct SyncSession {
    pub checksums: ChecksumStore,
    pub folders: VecDeque<FolderTask>,
    pub files: VecDeque<FileTask>,
    pub report: SyncReport,
    pub failures: Vec<SyncError>,
}

impl SyncSession {
    pub fn new(checksums: ChecksumStore) -> Self {
        Self {
            checksums,
            ..Self::default()
        }
    }

    pub(crate) fn record_failure(&mut self, err: SyncError) {
        tracing::warn!("{err}");
        self.failures.push(err);
    }
}
