mod checksum_store;
mod error;

pub use checksum_store::ChecksumStore;
pub use error::*;
