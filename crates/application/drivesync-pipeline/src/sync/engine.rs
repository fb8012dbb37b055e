use camino::Utf8Path;
use drivesync_infra::net::DownloadEvent;
use drivesync_infra::AccessToken;
use drivesync_persistence::{ChecksumStore, StorageErrorKind};
use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

use crate::sync::crawl::FolderCrawler;
use crate::sync::download::DownloadPipeline;
use crate::sync::paths::PathMapper;
use crate::sync::remote::{DriveRemoteStore, RemoteStore};
use crate::sync::session::SyncSession;
use crate::sync::upload::UploadTask;
use crate::sync::{SyncError, SyncRequest, SyncResult};

/// Runs the two top-level operations: a full download sync and a single
/// upload.
pub struct SyncEngine {
    remote: Box<dyn RemoteStore>,
}

impl SyncEngine {
    pub fn new(client: reqwest::Client, token: AccessToken) -> Self {
        Self {
            remote: Box::new(DriveRemoteStore::new(client, token)),
        }
    }

    pub fn with_remote(remote: Box<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Load manifest → crawl to completion → drain downloads → persist.
    ///
    /// Crawling finishes before the first byte is fetched. Per-item failures
    /// end up in [`SyncResult::failures`]; only manifest I/O aborts the run.
    pub async fn sync(
        &self,
        req: &SyncRequest,
        progress_tx: Option<Sender<DownloadEvent>>,
    ) -> Result<SyncResult, SyncError> {
        let checksums = match req.manifest_path.as_deref() {
            Some(path) => load_manifest(path)?,
            None => {
                warn!("No checksum manifest configured; every file is treated as stale");
                ChecksumStore::new()
            }
        };
        let mut session = SyncSession::new(checksums);
        let paths = PathMapper::new(req.overrides.clone());

        info!("Searching folder {}...", req.root_id);
        FolderCrawler::new(&*self.remote, &paths)
            .crawl(&mut session, &req.root_folder, &req.root_id)
            .await;

        info!("Downloading {} files...", session.files.len());
        DownloadPipeline::new(&*self.remote, &paths, &req.options)
            .drain(
                &mut session,
                req.manifest_path.as_deref(),
                progress_tx.as_ref(),
            )
            .await;

        if let Some(path) = req.manifest_path.as_deref() {
            info!("Saving new checksum file {path}...");
            session.checksums.persist(path)?;
        }

        let SyncSession {
            checksums,
            report,
            failures,
            ..
        } = session;
        Ok(SyncResult {
            report,
            failures,
            checksums,
        })
    }

    pub async fn upload(&self, local_path: &Utf8Path, folder_id: &str) -> Result<String, SyncError> {
        UploadTask::new(&*self.remote)
            .upload(local_path, folder_id)
            .await
    }
}

/// A corrupt manifest costs a full re-download, not the run.
fn load_manifest(path: &Utf8Path) -> Result<ChecksumStore, SyncError> {
    match ChecksumStore::load(path) {
        Ok(store) => {
            info!("Loaded {} checksums from {path}", store.len());
            Ok(store)
        }
        Err(e) if e.kind() == StorageErrorKind::Corrupt => {
            warn!("{e}; starting from an empty manifest");
            Ok(ChecksumStore::new())
        }
        Err(e) => Err(e.into()),
    }
}
