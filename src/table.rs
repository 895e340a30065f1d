//! Fixed-size bucket table.
//!
//! Each slot is an atomically swappable `Option<Arc<Block>>`. Readers load a
//! slot without locking; the writer replaces it with a fully built block. A
//! reader that loaded the old block keeps a valid reference to it until it
//! lets go.

use std::sync::Arc;

use arc_swap::{ArcSwapOption, Guard};

use crate::block::Block;
use crate::error::{Error, Result};
use crate::hash::key_hash;
use crate::value::AtomicValue;

/// Largest bucket count: the biggest power of two that fits in 31 bits.
pub const MAX_CAPACITY: usize = 1 << 30;

type Slot<V> = ArcSwapOption<Block<V>>;

/// Smallest power of two `>= max(requested, 2)`, capped at [`MAX_CAPACITY`].
pub fn resolve_capacity(requested: usize) -> usize {
    requested.clamp(2, MAX_CAPACITY).next_power_of_two()
}

pub(crate) struct BucketTable<V: AtomicValue> {
    slots: Box<[Slot<V>]>,
    mask: usize,
}

impl<V: AtomicValue> BucketTable<V> {
    pub fn new(requested: usize) -> Result<Self> {
        let capacity = resolve_capacity(requested);
        let bytes = capacity
            .checked_mul(std::mem::size_of::<Slot<V>>())
            .filter(|&b| b <= isize::MAX as usize)
            .ok_or(Error::CapacityOverflow { requested })?;

        let mut slots: Vec<Slot<V>> = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::Alloc { bytes })?;
        slots.extend((0..capacity).map(|_| ArcSwapOption::empty()));

        Ok(Self {
            slots: slots.into_boxed_slice(),
            mask: capacity - 1,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn bucket_index(&self, key: &str) -> usize {
        key_hash(key.as_bytes()) as usize & self.mask
    }

    /// Borrow the block in `bucket` for a short read.
    #[inline]
    pub fn load(&self, bucket: usize) -> Guard<Option<Arc<Block<V>>>> {
        self.slots[bucket].load()
    }

    /// Take an owned reference to the block in `bucket`.
    #[inline]
    pub fn load_full(&self, bucket: usize) -> Option<Arc<Block<V>>> {
        self.slots[bucket].load_full()
    }

    /// Replace the block in `bucket`. Caller must hold the writer lock.
    #[inline]
    pub fn publish(&self, bucket: usize, block: Block<V>) {
        self.slots[bucket].store(Some(Arc::new(block)));
    }
}
