use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use futures::stream::{BoxStream, StreamExt};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use crate::hashing::{checksum_matches, StreamingChecksum};

pub type StreamError = Box<dyn std::error::Error + Send + Sync>;

/// Body of a remote file, delivered in chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

const RENAME_ATTEMPTS: u32 = 8;

/// HTTP client shared by every remote call in a run.
pub fn default_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("drivesync/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .build()
}

#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub id: u64,
    pub target_path: Utf8PathBuf,
    pub expected_checksum: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WriteResult {
    pub bytes_written: u64,
    /// MD5 of what was written, lowercase hex.
    pub checksum: String,
}

#[derive(Debug)]
pub enum DownloadEvent {
    Started { id: u64, name: String },
    Progress { id: u64, bytes_delta: u64 },
    Completed { id: u64, success: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("content stream failed: {0}")]
    Stream(StreamError),
    #[error("io error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rate limiter: {0}")]
    RateLimit(#[from] governor::InsufficientCapacity),
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: Utf8PathBuf,
        expected: String,
        actual: String,
    },
}

/// Byte budget per second. Chunks are fed to the limiter in pieces no larger
/// than its burst size, which it could never grant in one go.
struct Throttle {
    limiter: Limiter,
    burst: NonZeroU32,
}

impl Throttle {
    fn new(bytes_per_sec: NonZeroU32) -> Self {
        let quota = Quota::per_second(bytes_per_sec);
        Self {
            burst: quota.burst_size(),
            limiter: RateLimiter::direct(quota),
        }
    }

    async fn admit(&self, chunk: &[u8]) -> Result<(), TransferError> {
        for piece in chunk.chunks(self.burst.get() as usize) {
            if let Some(n) = NonZeroU32::new(piece.len() as u32) {
                self.limiter.until_n_ready(n).await?;
            }
        }
        Ok(())
    }
}

/// Persists a content stream to disk: `<target>.<id>.part` first, renamed over
/// the target only once every byte arrived (and, if requested, hashed to the
/// expected checksum). The target therefore always holds exactly one
/// complete download, never a concatenation.
pub struct ContentWriter {
    throttle: Option<Arc<Throttle>>,
}

impl ContentWriter {
    pub fn new(rate_limit_bytes: Option<u64>) -> Self {
        let throttle = rate_limit_bytes
            .and_then(|bps| NonZeroU32::new(u32::try_from(bps).unwrap_or(u32::MAX)))
            .map(|bps| Arc::new(Throttle::new(bps)));
        Self { throttle }
    }

    /// Scratch file for one transfer. Keyed by request id so two remote files
    /// that map onto the same target never share a `.part`.
    pub fn part_path(target: &Utf8Path, id: u64) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{target}.{id}.part"))
    }

    pub async fn write(
        &self,
        req: WriteRequest,
        stream: ByteStream,
        tx: Option<&Sender<DownloadEvent>>,
    ) -> Result<WriteResult, TransferError> {
        let tmp_path = Self::part_path(&req.target_path, req.id);

        let res = self.write_inner(&req, &tmp_path, stream, tx).await;
        if res.is_err() {
            let _ = tokio::fs::remove_file(tmp_path.as_std_path()).await;
        }
        res
    }

    async fn write_inner(
        &self,
        req: &WriteRequest,
        tmp_path: &Utf8Path,
        mut stream: ByteStream,
        tx: Option<&Sender<DownloadEvent>>,
    ) -> Result<WriteResult, TransferError> {
        let io_err = |path: &Utf8Path| {
            let path = path.to_owned();
            move |source: std::io::Error| TransferError::Io { path, source }
        };

        if let Some(parent) = req.target_path.parent() {
            if !parent.as_str().is_empty() {
                tokio::fs::create_dir_all(parent.as_std_path())
                    .await
                    .map_err(io_err(parent))?;
            }
        }

        let mut file = File::create(tmp_path.as_std_path())
            .await
            .map_err(io_err(tmp_path))?;
        let mut hasher = StreamingChecksum::new();
        let mut total_written = 0u64;
        let mut accumulated = 0u64;
        let mut last_emit = Instant::now();

        while let Some(chunk_res) = stream.next().await {
            let chunk = chunk_res.map_err(TransferError::Stream)?;
            if let Some(throttle) = &self.throttle {
                throttle.admit(&chunk).await?;
            }
            hasher.consume(&chunk);
            file.write_all(&chunk).await.map_err(io_err(tmp_path))?;

            let len = chunk.len() as u64;
            total_written += len;
            accumulated += len;
            if accumulated > 1_000_000 || last_emit.elapsed().as_millis() > 100 {
                emit_progress(tx, req.id, accumulated).await;
                accumulated = 0;
                last_emit = Instant::now();
            }
        }
        if accumulated > 0 {
            emit_progress(tx, req.id, accumulated).await;
        }

        file.flush().await.map_err(io_err(tmp_path))?;
        drop(file);

        let actual = hasher.finish();
        if let Some(expected) = &req.expected_checksum {
            if !checksum_matches(&actual, expected) {
                warn!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    req.target_path, expected, actual
                );
                return Err(TransferError::ChecksumMismatch {
                    path: req.target_path.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        commit(tmp_path, &req.target_path)
            .await
            .map_err(io_err(&req.target_path))?;

        Ok(WriteResult {
            bytes_written: total_written,
            checksum: actual,
        })
    }
}

/// Move a finished `.part` over its target, retrying while something else
/// (antivirus, an indexer) briefly holds the target open. A vanished `.part`
/// fails at once.
async fn commit(tmp_path: &Utf8Path, target: &Utf8Path) -> std::io::Result<()> {
    let mut attempt = 1;
    let mut delay = Duration::from_millis(50);
    loop {
        match tokio::fs::rename(tmp_path, target).await {
            Err(e) if e.kind() != ErrorKind::NotFound && attempt < RENAME_ATTEMPTS => {
                debug!("Renaming {tmp_path} onto {target} failed ({e}), retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(2));
                attempt += 1;
            }
            res => return res,
        }
    }
}

async fn emit_progress(tx: Option<&Sender<DownloadEvent>>, id: u64, bytes_delta: u64) {
    if let Some(t) = tx {
        let _ = t.send(DownloadEvent::Progress { id, bytes_delta }).await;
    }
}
