#![allow(dead_code)]

use bytes::Bytes;
use camino::Utf8PathBuf;
use drivesync_core::RemoteNode;
use drivesync_infra::net::{ByteStream, StreamError};
use drivesync_pipeline::sync::remote::{RemoteError, RemoteStore};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory remote tree that records every call made against it.
#[derive(Default)]
pub struct FakeRemote {
    pub children: Mutex<HashMap<String, Vec<RemoteNode>>>,
    pub contents: Mutex<HashMap<String, Vec<u8>>>,
    pub failing_listings: HashSet<String>,
    pub failing_fetches: HashSet<String>,
    pub reject_creates: bool,
    pub list_calls: Mutex<Vec<String>>,
    pub fetch_calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(self, id: &str, kids: Vec<RemoteNode>) -> Self {
        self.children.lock().unwrap().insert(id.into(), kids);
        self
    }

    pub fn content(self, id: &str, data: &[u8]) -> Self {
        self.contents.lock().unwrap().insert(id.into(), data.to_vec());
        self
    }

    pub fn set_children(&self, id: &str, kids: Vec<RemoteNode>) {
        self.children.lock().unwrap().insert(id.into(), kids);
    }

    pub fn set_content(&self, id: &str, data: &[u8]) {
        self.contents.lock().unwrap().insert(id.into(), data.to_vec());
    }

    pub fn listed(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RemoteStore for FakeRemote {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, RemoteError> {
        self.list_calls.lock().unwrap().push(folder_id.to_string());
        if self.failing_listings.contains(folder_id) {
            return Err(RemoteError::Status {
                status: 500,
                body: "backend error".into(),
            });
        }
        Ok(self
            .children
            .lock()
            .unwrap()
            .get(folder_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_content(&self, file_id: &str) -> Result<ByteStream, RemoteError> {
        self.fetch_calls.lock().unwrap().push(file_id.to_string());
        if self.failing_fetches.contains(file_id) {
            return Err(RemoteError::Other(format!("fetch of {file_id} refused")));
        }
        let data = self
            .contents
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                body: "not found".into(),
            })?;
        Ok(futures::stream::iter(vec![Ok::<Bytes, StreamError>(Bytes::from(data))]).boxed())
    }

    async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        content: ByteStream,
        size: u64,
    ) -> Result<String, RemoteError> {
        if self.reject_creates {
            return Err(RemoteError::Status {
                status: 403,
                body: "insufficient permissions".into(),
            });
        }
        let chunks: Vec<Result<Bytes, StreamError>> = content.collect().await;
        let mut data = Vec::new();
        for chunk in chunks {
            data.extend_from_slice(&chunk.map_err(|e| RemoteError::Other(e.to_string()))?);
        }
        if data.len() as u64 != size {
            return Err(RemoteError::Other(format!(
                "declared {size} bytes, received {}",
                data.len()
            )));
        }
        let mut created = self.created.lock().unwrap();
        created.push((name.to_string(), parent_id.to_string(), data));
        Ok(format!("NEW{}", created.len()))
    }
}

pub fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}
