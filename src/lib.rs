//! # lockfree-strmap
//!
//! A string-keyed map for read-heavy workloads: any number of threads read
//! without locking while writers are serialized through one global mutex.
//!
//! ## Design
//!
//! Keys hash (CRC32) into a fixed, power-of-two number of buckets. Each
//! occupied bucket holds one immutable **block**: a single arena with every
//! key's text plus a sorted index of `(key view, value cell)` entries.
//!
//! - Readers load the bucket's block through an atomic slot and binary-search
//!   it. They never block and never observe a half-built block.
//! - Adding a key builds a new block for the bucket (old keys + new key in a
//!   freshly sized arena) and swaps it in. Readers still holding the old block
//!   keep a consistent view of it until they drop it.
//! - Updating an existing key stores the new value into the entry's atomic
//!   cell in place; no new block is published.
//!
//! There is no deletion and no resizing. Iteration is per bucket with no
//! snapshot across buckets.
//!
//! ## Example
//!
//! ```rust
//! use lockfree_strmap::{add, assign, LockfreeStrMap};
//!
//! let map: LockfreeStrMap<u64> = LockfreeStrMap::new(3).unwrap();
//! assert_eq!(map.capacity(), 4);
//!
//! map.set("alpha", 1, assign).unwrap();
//! map.set("beta", 2, assign).unwrap();
//! map.set("alpha", 10, add).unwrap();
//!
//! assert_eq!(map.get("alpha"), Some(11));
//! assert_eq!(map.get("gamma"), None);
//!
//! map.set_many(vec![("beta", 1), ("gamma", 7)], add).unwrap();
//! assert_eq!(map.get("beta"), Some(3));
//! assert_eq!(map.len(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod block;
pub mod config;
pub mod error;
pub mod hash;
mod map;
mod table;
pub mod value;

pub use config::Config;
pub use error::{Error, Result};
pub use map::{Iter, LockfreeStrMap, MapStats};
pub use table::{resolve_capacity, MAX_CAPACITY};
pub use value::{add, assign, AtomicValue};

#[cfg(test)]
mod proptests;
