//! Map configuration.

/// Default number of buckets requested when none is given.
pub const DEFAULT_CAPACITY_HINT: usize = 1024;

/// Default key length limit (fits a `u16` length field).
pub const DEFAULT_MAX_KEY_LEN: usize = u16::MAX as usize;

/// Configuration for a [`LockfreeStrMap`](crate::LockfreeStrMap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Requested bucket count; rounded up to a power of two (minimum 2).
    pub capacity_hint: usize,
    /// Longest key, in bytes, a writer accepts.
    pub max_key_len: usize,
}

impl Config {
    /// Set the requested bucket count.
    pub fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }

    /// Set the key length limit.
    pub fn with_max_key_len(mut self, max_key_len: usize) -> Self {
        self.max_key_len = max_key_len;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_hint: DEFAULT_CAPACITY_HINT,
            max_key_len: DEFAULT_MAX_KEY_LEN,
        }
    }
}
