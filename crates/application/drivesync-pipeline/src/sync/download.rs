use camino::Utf8Path;
use drivesync_core::FileTask;
use drivesync_infra::net::{ContentWriter, DownloadEvent, WriteRequest, WriteResult};
use futures::StreamExt;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use crate::sync::paths::PathMapper;
use crate::sync::remote::RemoteStore;
use crate::sync::session::SyncSession;
use crate::sync::{SyncError, SyncOptions};

/// Drains the session's file queue.
///
/// Transfers run through a bounded pool (`max_threads`, one by default), but
/// checksum bookkeeping happens only here on the draining task, after a
/// file's bytes have landed at their final path.
pub struct DownloadPipeline<'a> {
    remote: &'a dyn RemoteStore,
    paths: &'a PathMapper,
    options: &'a SyncOptions,
    writer: ContentWriter,
}

impl<'a> DownloadPipeline<'a> {
    pub fn new(remote: &'a dyn RemoteStore, paths: &'a PathMapper, options: &'a SyncOptions) -> Self {
        Self {
            remote,
            paths,
            options,
            writer: ContentWriter::new(options.rate_limit_bytes),
        }
    }

    pub async fn drain(
        &self,
        session: &mut SyncSession,
        checkpoint_path: Option<&Utf8Path>,
        progress_tx: Option<&Sender<DownloadEvent>>,
    ) {
        let tasks: Vec<(u64, FileTask)> = session
            .files
            .drain(..)
            .enumerate()
            .map(|(i, task)| (i as u64, task))
            .collect();
        let concurrency = drivesync_config::clamp_threads(self.options.max_threads);

        let mut results = futures::stream::iter(tasks)
            .map(|(id, task)| self.download_one(id, task, progress_tx))
            .buffer_unordered(concurrency);

        let mut since_checkpoint = 0usize;
        while let Some((task, outcome)) = results.next().await {
            match outcome {
                Ok(written) => {
                    match &task.node.checksum {
                        Some(checksum) => session.checksums.set(task.node.id.clone(), checksum),
                        None => {
                            session.checksums.remove(&task.node.id);
                        }
                    }
                    session.report.files_downloaded += 1;
                    session.report.bytes_downloaded += written.bytes_written;
                    debug!(
                        "{} saved ({} bytes, md5 {})",
                        task.node.name, written.bytes_written, written.checksum
                    );
                    since_checkpoint += 1;

                    if let (Some(every), Some(path)) = (self.options.checkpoint_every, checkpoint_path) {
                        if every > 0 && since_checkpoint >= every {
                            since_checkpoint = 0;
                            if let Err(e) = session.checksums.persist(path) {
                                warn!("Checkpointing checksums to {path} failed: {e}");
                            }
                        }
                    }
                }
                Err(err) => {
                    session.report.files_failed += 1;
                    session.record_failure(err);
                }
            }
        }
    }

    async fn download_one(
        &self,
        id: u64,
        task: FileTask,
        progress_tx: Option<&Sender<DownloadEvent>>,
    ) -> (FileTask, Result<WriteResult, SyncError>) {
        if let Some(tx) = progress_tx {
            let _ = tx
                .send(DownloadEvent::Started {
                    id,
                    name: task.node.name.clone(),
                })
                .await;
        }

        let outcome = self.fetch_and_write(id, &task, progress_tx).await;

        if let Some(tx) = progress_tx {
            let _ = tx
                .send(DownloadEvent::Completed {
                    id,
                    success: outcome.is_ok(),
                })
                .await;
        }
        (task, outcome)
    }

    async fn fetch_and_write(
        &self,
        id: u64,
        task: &FileTask,
        progress_tx: Option<&Sender<DownloadEvent>>,
    ) -> Result<WriteResult, SyncError> {
        let stream = self
            .remote
            .fetch_content(&task.node.id)
            .await
            .map_err(|source| SyncError::Fetch {
                file_id: task.node.id.clone(),
                source,
            })?;

        let target = self
            .paths
            .file_target(&task.target_local_path, &task.node.name);
        info!("Saving file {target}...");

        let expected_checksum = if self.options.verify_checksums {
            task.node.checksum.clone()
        } else {
            None
        };
        self.writer
            .write(
                WriteRequest {
                    id,
                    target_path: target.clone(),
                    expected_checksum,
                },
                stream,
                progress_tx,
            )
            .await
            .map_err(|source| SyncError::Write {
                path: target,
                source,
            })
    }
}
