//! Error types for map construction and writes.

use thiserror::Error;

/// Errors reported by constructors and writers.
///
/// Readers never fail; a missing key is `None`, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An arena, entry index or slot array could not be allocated.
    #[error("allocation of {bytes} bytes failed")]
    Alloc {
        /// Size of the failed request
        bytes: usize,
    },
    /// The requested bucket count cannot be represented.
    #[error("bucket capacity overflow (requested {requested})")]
    CapacityOverflow {
        /// Capacity hint passed by the caller
        requested: usize,
    },
    /// A key is longer than the configured maximum.
    #[error("key of {len} bytes exceeds maximum of {max}")]
    KeyTooLong {
        /// Length of the rejected key
        len: usize,
        /// Configured limit
        max: usize,
    },
    /// A block would outgrow its 32-bit arena offsets or entry count.
    #[error("bucket {bucket} is full")]
    BlockFull {
        /// Index of the bucket that rejected the write
        bucket: usize,
    },
}

/// Result type for map operations.
pub type Result<T> = std::result::Result<T, Error>;
