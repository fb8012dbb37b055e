use md5::Context;

/// Incremental MD5 over a byte stream, rendered the way the remote store
/// reports `md5Checksum` (lowercase hex).
pub struct StreamingChecksum {
    ctx: Context,
}

impl StreamingChecksum {
    pub fn new() -> Self {
        Self {
            ctx: Context::new(),
        }
    }

    pub fn consume(&mut self, data: &[u8]) {
        self.ctx.consume(data);
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.ctx.finalize())
    }
}

impl Default for StreamingChecksum {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksums are hex strings; case differs between producers.
pub fn checksum_matches(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected)
}
