//! Key hashing.

/// CRC32 of the key bytes.
///
/// Only the low bits are used for bucket selection, so any stable hash with
/// reasonable distribution would do.
#[inline]
pub fn key_hash(key: &[u8]) -> u32 {
    crc32fast::hash(key)
}
