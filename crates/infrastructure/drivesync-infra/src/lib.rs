pub mod auth;
pub mod hashing;
pub mod net;

// Re-exports for convenience
pub use auth::{AccessToken, AuthError};
pub use hashing::{checksum_matches, StreamingChecksum};
pub use net::{
    default_http_client, ByteStream, ContentWriter, DownloadEvent, StreamError, TransferError,
    WriteRequest, WriteResult,
};
