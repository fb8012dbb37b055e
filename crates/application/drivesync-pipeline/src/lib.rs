pub mod sync;

// Re-export core engine components
pub use sync::{
    default_engine, SyncEngine, SyncError, SyncOptions, SyncReport, SyncRequest, SyncResult,
};

// Re-export infra types often needed by consumers
pub use drivesync_infra::net::DownloadEvent;
