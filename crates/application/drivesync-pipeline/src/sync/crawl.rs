use camino::Utf8Path;
use drivesync_core::diff::{classify, Freshness};
use drivesync_core::path_utils::DrivePath;
use drivesync_core::{FileTask, FolderTask, NodeKind, RemoteNode};
use tracing::{debug, info};

use crate::sync::paths::PathMapper;
use crate::sync::remote::RemoteStore;
use crate::sync::session::SyncSession;
use crate::sync::SyncError;

/// Breadth-first walk of the remote tree.
///
/// Creates local directories as folders are discovered and fills the
/// session's file queue with every stale file. Folders are listed one at a
/// time, and every child of a listing is classified before the next folder
/// is dequeued. The remote tree is trusted to be acyclic.
pub struct FolderCrawler<'a> {
    remote: &'a dyn RemoteStore,
    paths: &'a PathMapper,
}

impl<'a> FolderCrawler<'a> {
    pub fn new(remote: &'a dyn RemoteStore, paths: &'a PathMapper) -> Self {
        Self { remote, paths }
    }

    pub async fn crawl(&self, session: &mut SyncSession, root_path: &Utf8Path, root_id: &str) {
        if let Err(source) = PathMapper::ensure_dir(root_path).await {
            session.record_failure(SyncError::Local {
                path: root_path.to_owned(),
                source,
            });
            return;
        }

        session.folders.push_back(FolderTask {
            target_local_path: root_path.to_owned(),
            remote_folder_id: root_id.to_string(),
        });

        while let Some(task) = session.folders.pop_front() {
            session.report.folders_visited += 1;

            let children = match self.remote.list_children(&task.remote_folder_id).await {
                Ok(children) => children,
                Err(source) => {
                    session.report.listing_failures += 1;
                    session.record_failure(SyncError::Listing {
                        folder_id: task.remote_folder_id,
                        source,
                    });
                    continue;
                }
            };

            if children.is_empty() {
                info!("No files found in {}", task.target_local_path);
                continue;
            }
            info!(
                "Listed {} entries in {}",
                children.len(),
                task.target_local_path
            );

            for child in children {
                self.classify_child(session, &task.target_local_path, child)
                    .await;
            }
        }
    }

    async fn classify_child(&self, session: &mut SyncSession, parent: &Utf8Path, child: RemoteNode) {
        let name = DrivePath::sanitize_name(&child.name);
        debug!("Processing {name}...");

        match child.kind {
            NodeKind::Folder => match self.paths.resolve_dir(parent, &name).await {
                Ok(child_path) => session.folders.push_back(FolderTask {
                    target_local_path: child_path,
                    remote_folder_id: child.id,
                }),
                Err(source) => session.record_failure(SyncError::Local {
                    path: self.paths.resolve(parent, &name),
                    source,
                }),
            },
            NodeKind::File => {
                session.report.files_seen += 1;
                let stored = session.checksums.get(&child.id);
                match classify(child.checksum.as_deref(), stored) {
                    Freshness::Unchanged => {
                        session.report.files_unchanged += 1;
                        debug!("{name} unchanged, skipping");
                    }
                    Freshness::Unhashed => {
                        session.report.files_unhashed += 1;
                        debug!("{name} has no checksum, skipping");
                    }
                    Freshness::Stale => {
                        session.report.files_queued += 1;
                        session.files.push_back(FileTask {
                            target_local_path: parent.to_owned(),
                            node: RemoteNode { name, ..child },
                        });
                    }
                }
            }
        }
    }
}
