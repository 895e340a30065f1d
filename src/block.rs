//! Immutable per-bucket blocks.
//!
//! A block holds every key that hashes to one bucket.
//! Layout: `arena` = all key bytes concatenated, `entries` = sorted
//! `(offset, len, value cell)` views into the arena.
//!
//! Blocks are never mutated in their key set once published. Adding a key
//! means building a new block: the arena is sized and filled completely, and
//! only then is the entry index built from positions in that final arena.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::value::AtomicValue;

/// One key of a block: a view into the block's arena plus its value cell.
pub(crate) struct Entry<V: AtomicValue> {
    offset: u32,
    len: u32,
    value: V::Cell,
}

#[inline]
fn slice(arena: &str, offset: u32, len: u32) -> &str {
    let start = offset as usize;
    &arena[start..start + len as usize]
}

pub(crate) struct Block<V: AtomicValue> {
    arena: Box<str>,
    entries: Box<[Entry<V>]>,
}

impl<V: AtomicValue> Block<V> {
    /// Number of keys in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Bytes of key text held by the arena.
    #[inline]
    pub fn arena_bytes(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    fn key_of(&self, entry: &Entry<V>) -> &str {
        slice(&self.arena, entry.offset, entry.len)
    }

    fn find(&self, key: &str) -> Option<&Entry<V>> {
        self.entries
            .binary_search_by(|e| self.key_of(e).cmp(key))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.find(key).map(|e| V::load(&e.value))
    }

    /// Key and current value at `idx` in key order.
    #[inline]
    pub fn entry(&self, idx: usize) -> (&str, V) {
        let e = &self.entries[idx];
        (self.key_of(e), V::load(&e.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, V)> + '_ {
        self.entries
            .iter()
            .map(move |e| (self.key_of(e), V::load(&e.value)))
    }

    /// Apply `updater` to the value of `key` in place.
    ///
    /// Returns `false` if the key is not in this block. Must only be called
    /// while holding the writer lock: the load/update/store sequence is not
    /// atomic as a whole, only each access is.
    pub fn update<F>(&self, key: &str, value: V, updater: &F) -> bool
    where
        F: Fn(&mut V, V),
    {
        match self.find(key) {
            Some(e) => {
                let mut current = V::load(&e.value);
                updater(&mut current, value);
                V::store(&e.value, current);
                true
            }
            None => false,
        }
    }

    /// Build a block holding every entry of `old` plus `fresh`.
    ///
    /// `fresh` must be sorted by key, free of duplicates, and disjoint from
    /// `old`. The old arena is copied to the front of the new one, so old
    /// entries keep their offsets; fresh keys are appended after it.
    pub fn merge(bucket: usize, old: Option<&Block<V>>, fresh: &[(&str, V)]) -> Result<Self> {
        debug_assert!(fresh.windows(2).all(|w| w[0].0 < w[1].0));

        let old_arena: &str = old.map_or("", |b| &b.arena[..]);
        let old_entries: &[Entry<V>] = old.map_or(&[][..], |b| &b.entries[..]);

        let count = old_entries.len() + fresh.len();
        let arena_len = fresh
            .iter()
            .try_fold(old_arena.len(), |acc, (key, _)| acc.checked_add(key.len()))
            .ok_or(Error::BlockFull { bucket })?;
        if arena_len > u32::MAX as usize || count > u32::MAX as usize {
            return Err(Error::BlockFull { bucket });
        }

        // Phase 1: fill the arena to its final size.
        let mut arena = String::new();
        arena
            .try_reserve_exact(arena_len)
            .map_err(|_| Error::Alloc { bytes: arena_len })?;
        arena.push_str(old_arena);
        let mut fresh_offsets: Vec<u32> = Vec::new();
        fresh_offsets
            .try_reserve_exact(fresh.len())
            .map_err(|_| Error::Alloc {
                bytes: fresh.len() * std::mem::size_of::<u32>(),
            })?;
        for (key, _) in fresh {
            fresh_offsets.push(arena.len() as u32);
            arena.push_str(key);
        }
        debug_assert_eq!(arena.len(), arena_len);
        let arena = arena.into_boxed_str();

        // Phase 2: index the final arena, merging both sorted runs.
        let mut entries: Vec<Entry<V>> = Vec::new();
        entries.try_reserve_exact(count).map_err(|_| Error::Alloc {
            bytes: count.saturating_mul(std::mem::size_of::<Entry<V>>()),
        })?;

        let (mut i, mut j) = (0, 0);
        while i < old_entries.len() || j < fresh.len() {
            let take_old = match (old_entries.get(i), fresh.get(j)) {
                (Some(o), Some((key, _))) => {
                    let ord = slice(&arena, o.offset, o.len).cmp(key);
                    debug_assert_ne!(ord, Ordering::Equal, "fresh key already in block");
                    ord == Ordering::Less
                }
                (Some(_), None) => true,
                _ => false,
            };

            if take_old {
                let o = &old_entries[i];
                entries.push(Entry {
                    offset: o.offset,
                    len: o.len,
                    value: V::new_cell(V::load(&o.value)),
                });
                i += 1;
            } else {
                let (key, value) = fresh[j];
                entries.push(Entry {
                    offset: fresh_offsets[j],
                    len: key.len() as u32,
                    value: V::new_cell(value),
                });
                j += 1;
            }
        }

        Ok(Self {
            arena,
            entries: entries.into_boxed_slice(),
        })
    }
}
