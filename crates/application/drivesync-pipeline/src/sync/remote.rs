use bytes::Bytes;
use drivesync_config::LIST_PAGE_SIZE;
use drivesync_core::{NodeKind, RemoteNode};
use drivesync_infra::net::{ByteStream, StreamError};
use drivesync_infra::AccessToken;
use futures::StreamExt;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3/";
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3/";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, md5Checksum)";
const MULTIPART_BOUNDARY: &str = "drivesync-7d1c5f0e9b4a42c38e1f6a2b";

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid url: {0}")]
    Url(String),
    #[error("{0}")]
    Other(String),
}

/// The remote hierarchical file store, as far as sync and upload need it.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every child of `folder_id`, in the order the store returned them
    /// (all pages).
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, RemoteError>;

    async fn fetch_content(&self, file_id: &str) -> Result<ByteStream, RemoteError>;

    /// Create `name` under `parent_id` from `size` bytes of `content` and
    /// return the new file's id.
    async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        content: ByteStream,
        size: u64,
    ) -> Result<String, RemoteError>;
}

#[async_trait::async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, RemoteError> {
        (**self).list_children(folder_id).await
    }

    async fn fetch_content(&self, file_id: &str) -> Result<ByteStream, RemoteError> {
        (**self).fetch_content(file_id).await
    }

    async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        content: ByteStream,
        size: u64,
    ) -> Result<String, RemoteError> {
        (**self).create_file(name, parent_id, content, size).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    md5_checksum: Option<String>,
}

impl From<DriveFile> for RemoteNode {
    fn from(f: DriveFile) -> Self {
        let kind = NodeKind::from_mime_type(&f.mime_type);
        RemoteNode {
            id: f.id,
            name: f.name,
            kind,
            checksum: match kind {
                NodeKind::Folder => None,
                NodeKind::File => f.md5_checksum,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Treat a base URL as a directory so `join("files")` appends rather than
/// replacing the last segment.
pub(crate) fn normalize_base(base: &str) -> Result<Url, RemoteError> {
    let mut url =
        Url::parse(base).map_err(|e| RemoteError::Url(format!("invalid base url {base}: {e}")))?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

/// Query-string literal for a folder id inside a `q` expression.
fn quote_query_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Remote store backed by the Drive v3 REST API.
pub struct DriveRemoteStore {
    client: Client,
    token: AccessToken,
    api_base: Url,
    upload_base: Url,
}

impl DriveRemoteStore {
    pub fn new(client: Client, token: AccessToken) -> Self {
        Self {
            client,
            token,
            api_base: Url::parse(DRIVE_API_BASE).expect("static url"),
            upload_base: Url::parse(DRIVE_UPLOAD_BASE).expect("static url"),
        }
    }

    /// Point the store at another host, e.g. a local test server.
    pub fn with_base_urls(
        client: Client,
        token: AccessToken,
        api_base: &str,
        upload_base: &str,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            client,
            token,
            api_base: normalize_base(api_base)?,
            upload_base: normalize_base(upload_base)?,
        })
    }

    fn files_url(&self) -> Result<Url, RemoteError> {
        self.api_base
            .join("files")
            .map_err(|e| RemoteError::Url(format!("bad files url from {}: {e}", self.api_base)))
    }

    fn file_url(&self, file_id: &str) -> Result<Url, RemoteError> {
        let mut url = self.files_url()?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Url("cannot mutate url segments".into()))?
            .push(file_id);
        Ok(url)
    }

    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileListPage, RemoteError> {
        let mut url = self.files_url()?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("q", &format!("{} in parents", quote_query_literal(folder_id)))
                .append_pair("pageSize", &LIST_PAGE_SIZE.to_string())
                .append_pair("fields", LIST_FIELDS);
            if let Some(token) = page_token {
                q.append_pair("pageToken", token);
            }
        }

        let resp = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Framing around the file bytes of a multipart/related upload: the JSON
/// metadata part plus the media part header, and the closing delimiter.
fn multipart_related_frame(metadata: &serde_json::Value) -> (Bytes, Bytes) {
    let head = format!(
        "--{MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{MULTIPART_BOUNDARY}\r\nContent-Type: application/octet-stream\r\n\r\n"
    );
    let tail = format!("\r\n--{MULTIPART_BOUNDARY}--\r\n");
    (Bytes::from(head), Bytes::from(tail))
}

#[async_trait::async_trait]
impl RemoteStore for DriveRemoteStore {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, RemoteError> {
        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(folder_id, page_token.as_deref()).await?;
            nodes.extend(page.files.into_iter().map(RemoteNode::from));
            match page.next_page_token {
                Some(next) if !next.is_empty() => {
                    debug!("Folder {folder_id} has more children, fetching next page");
                    page_token = Some(next);
                }
                _ => break,
            }
        }
        Ok(nodes)
    }

    async fn fetch_content(&self, file_id: &str) -> Result<ByteStream, RemoteError> {
        let mut url = self.file_url(file_id)?;
        url.query_pairs_mut().append_pair("alt", "media");

        let resp = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.bytes_stream().map(|r| r.map_err(|e| Box::new(e) as StreamError)).boxed())
    }

    async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        content: ByteStream,
        size: u64,
    ) -> Result<String, RemoteError> {
        let mut url = self
            .upload_base
            .join("files")
            .map_err(|e| RemoteError::Url(format!("bad upload url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", "id");

        let metadata = serde_json::json!({ "name": name, "parents": [parent_id] });
        let (head, tail) = multipart_related_frame(&metadata);
        let length = head.len() as u64 + size + tail.len() as u64;
        let body = futures::stream::once(async move { Ok::<Bytes, StreamError>(head) })
            .chain(content)
            .chain(futures::stream::once(async move { Ok(tail) }));

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;
        let created: CreatedFile = check_status(resp).await?.json().await?;
        Ok(created.id)
    }
}
