pub mod commands;

use drivesync_pipeline::SyncOptions;

/// Download tuning flags shared by the binary and tests.
#[derive(Debug, Clone, Default)]
pub struct DownloadFlags {
    pub threads: Option<usize>,
    pub limit_mb: Option<u64>,
    pub verify: bool,
    pub checkpoint_every: Option<usize>,
}

impl From<DownloadFlags> for SyncOptions {
    fn from(f: DownloadFlags) -> Self {
        let defaults = SyncOptions::default();
        SyncOptions {
            max_threads: f
                .threads
                .map(drivesync_config::clamp_threads)
                .unwrap_or(defaults.max_threads),
            rate_limit_bytes: f.limit_mb.map(|mb| mb.saturating_mul(1024 * 1024)),
            verify_checksums: f.verify,
            checkpoint_every: f.checkpoint_every.filter(|n| *n > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_limit_saturates_instead_of_overflowing() {
        let options: SyncOptions = DownloadFlags {
            limit_mb: Some(u64::MAX),
            ..DownloadFlags::default()
        }
        .into();
        assert_eq!(options.rate_limit_bytes, Some(u64::MAX));
    }

    #[test]
    fn defaults_keep_sequential_unthrottled_run() {
        let options: SyncOptions = DownloadFlags::default().into();
        assert_eq!(options.max_threads, 1);
        assert_eq!(options.rate_limit_bytes, None);
        assert!(!options.verify_checksums);
    }
}
