/// Outcome of comparing a remote file's checksum against the last synced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Stored checksum equals the remote checksum; nothing to do.
    Unchanged,
    /// Checksums differ, or nothing is stored yet.
    Stale,
    /// Neither side has a checksum (native documents). Never downloaded.
    Unhashed,
}

pub fn classify(remote: Option<&str>, stored: Option<&str>) -> Freshness {
    match (remote, stored) {
        (None, None) => Freshness::Unhashed,
        (Some(r), Some(s)) if r == s => Freshness::Unchanged,
        _ => Freshness::Stale,
    }
}

pub fn is_stale(remote: Option<&str>, stored: Option<&str>) -> bool {
    classify(remote, stored) == Freshness::Stale
}
