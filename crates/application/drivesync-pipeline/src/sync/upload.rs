use camino::Utf8Path;
use drivesync_infra::net::StreamError;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::sync::remote::RemoteStore;
use crate::sync::SyncError;

/// Single-shot upload of one local file into a remote folder. Shares no
/// state with the sync pipeline. The file is streamed, never held in memory
/// whole.
pub struct UploadTask<'a> {
    remote: &'a dyn RemoteStore,
}

impl<'a> UploadTask<'a> {
    pub fn new(remote: &'a dyn RemoteStore) -> Self {
        Self { remote }
    }

    /// Create a remote file named after `local_path`'s base name under
    /// `folder_id`; returns the new remote id.
    pub async fn upload(&self, local_path: &Utf8Path, folder_id: &str) -> Result<String, SyncError> {
        let name = local_path
            .file_name()
            .ok_or_else(|| SyncError::InvalidPath(local_path.to_owned()))?;

        let local_err = |source| SyncError::Local {
            path: local_path.to_owned(),
            source,
        };
        let file = tokio::fs::File::open(local_path.as_std_path())
            .await
            .map_err(local_err)?;
        let size = file.metadata().await.map_err(local_err)?.len();
        let content = ReaderStream::new(file)
            .map(|r| r.map_err(|e| Box::new(e) as StreamError))
            .boxed();

        let id = self
            .remote
            .create_file(name, folder_id, content, size)
            .await
            .map_err(|source| SyncError::RemoteWrite {
                path: local_path.to_owned(),
                source,
            })?;

        info!("File {id} uploaded successfully");
        Ok(id)
    }
}
