//! The public single-writer, lock-free-reader map.

use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::block::Block;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::table::BucketTable;
use crate::value::{assign, AtomicValue};

/// Memory and occupancy statistics for a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapStats {
    /// Number of buckets
    pub buckets: usize,
    /// Buckets holding a block
    pub occupied_buckets: usize,
    /// Number of keys stored
    pub keys: usize,
    /// Total key bytes across all block arenas
    pub arena_bytes: usize,
    /// Key count of the largest block
    pub largest_block: usize,
}

/// A string-keyed map with lock-free readers and one writer at a time.
///
/// Keys hash to one of a fixed number of buckets. Each bucket holds an
/// immutable block of keys; adding a key to a bucket builds a new block and
/// swaps it in, so readers never wait and never see a partially built block.
/// Updating an existing key's value is done in place through an atomic cell.
///
/// Keys are never removed.
pub struct LockfreeStrMap<V: AtomicValue> {
    table: BucketTable<V>,
    /// Serializes all writers across all buckets.
    writer: Mutex<()>,
    len: AtomicUsize,
    config: Config,
}

impl<V: AtomicValue> LockfreeStrMap<V> {
    /// Create a map with at least `capacity_hint` buckets.
    pub fn new(capacity_hint: usize) -> Result<Self> {
        Self::with_config(Config::default().with_capacity_hint(capacity_hint))
    }

    /// Create a map with the given configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let table = BucketTable::new(config.capacity_hint)?;
        tracing::debug!(
            requested = config.capacity_hint,
            capacity = table.capacity(),
            max_key_len = config.max_key_len,
            "created string map"
        );
        Ok(Self {
            table,
            writer: Mutex::new(()),
            len: AtomicUsize::new(0),
            config,
        })
    }

    /// Number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look up `key` without locking.
    pub fn get(&self, key: &str) -> Option<V> {
        let bucket = self.table.bucket_index(key);
        let guard = self.table.load(bucket);
        let block = guard.as_deref()?;
        block.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key` to `value`, overwriting any existing value.
    pub fn insert(&self, key: &str, value: V) -> Result<()> {
        self.set(key, value, assign)
    }

    /// Write `value` for `key`.
    ///
    /// If the key exists, `updater(&mut existing, value)` computes the new
    /// value, which is stored in place. Otherwise the key is added with
    /// `value` by publishing a new block for its bucket.
    pub fn set<F>(&self, key: &str, value: V, updater: F) -> Result<()>
    where
        F: Fn(&mut V, V),
    {
        self.check_key(key)?;
        let bucket = self.table.bucket_index(key);

        let _writer = self.writer.lock();
        let current = self.table.load_full(bucket);
        if let Some(block) = current.as_deref() {
            if block.update(key, value, &updater) {
                return Ok(());
            }
        }

        let block = self.build(bucket, current.as_deref(), &[(key, value)])?;
        self.publish(bucket, block, 1);
        Ok(())
    }

    /// Write many keys, taking the writer lock once per affected bucket.
    ///
    /// Equivalent to calling [`set`](Self::set) for each item in order.
    /// Key lengths are checked before anything is written. If building a
    /// block fails, buckets already processed keep their writes.
    pub fn set_many<I, K, F>(&self, items: I, updater: F) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        F: Fn(&mut V, V),
    {
        let mut partitions: BTreeMap<usize, SmallVec<[(K, V); 4]>> = BTreeMap::new();
        for (key, value) in items {
            self.check_key(key.as_ref())?;
            let bucket = self.table.bucket_index(key.as_ref());
            partitions.entry(bucket).or_default().push((key, value));
        }

        for (bucket, batch) in &partitions {
            self.merge_bucket(*bucket, batch, &updater)?;
        }
        Ok(())
    }

    fn merge_bucket<K, F>(&self, bucket: usize, batch: &[(K, V)], updater: &F) -> Result<()>
    where
        K: AsRef<str>,
        F: Fn(&mut V, V),
    {
        let _writer = self.writer.lock();
        let current = self.table.load_full(bucket);

        let mut fresh: BTreeMap<&str, V> = BTreeMap::new();
        for (key, value) in batch {
            let key = key.as_ref();
            if let Some(block) = current.as_deref() {
                if block.update(key, *value, updater) {
                    continue;
                }
            }
            match fresh.entry(key) {
                Entry::Vacant(e) => {
                    e.insert(*value);
                }
                Entry::Occupied(mut e) => updater(e.get_mut(), *value),
            }
        }

        if fresh.is_empty() {
            return Ok(());
        }

        let fresh: Vec<(&str, V)> = fresh.into_iter().collect();
        let block = self.build(bucket, current.as_deref(), &fresh)?;
        self.publish(bucket, block, fresh.len());
        Ok(())
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if key.len() > self.config.max_key_len {
            tracing::warn!(
                len = key.len(),
                max = self.config.max_key_len,
                "rejected write with oversized key"
            );
            return Err(Error::KeyTooLong {
                len: key.len(),
                max: self.config.max_key_len,
            });
        }
        Ok(())
    }

    fn build(&self, bucket: usize, old: Option<&Block<V>>, fresh: &[(&str, V)]) -> Result<Block<V>> {
        Block::merge(bucket, old, fresh).map_err(|err| {
            tracing::warn!(bucket, error = %err, "failed to build block");
            err
        })
    }

    fn publish(&self, bucket: usize, block: Block<V>, added: usize) {
        tracing::trace!(
            bucket,
            keys = block.len(),
            arena_bytes = block.arena_bytes(),
            "publishing block"
        );
        self.table.publish(bucket, block);
        self.len.fetch_add(added, Ordering::Relaxed);
    }

    /// Iterate over all entries, bucket by bucket.
    ///
    /// Each bucket is read at the moment the iterator reaches it; there is no
    /// snapshot across buckets.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            table: &self.table,
            next_bucket: 0,
            block: None,
            pos: 0,
        }
    }

    /// Visit every entry without allocating owned keys.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, V),
    {
        for bucket in 0..self.table.capacity() {
            let block = self.table.load(bucket);
            if let Some(block) = block.as_deref() {
                for (key, value) in block.iter() {
                    f(key, value);
                }
            }
        }
    }

    pub fn stats(&self) -> MapStats {
        let mut stats = MapStats {
            buckets: self.table.capacity(),
            ..MapStats::default()
        };
        for bucket in 0..self.table.capacity() {
            let block = self.table.load(bucket);
            if let Some(block) = block.as_deref() {
                stats.occupied_buckets += 1;
                stats.keys += block.len();
                stats.arena_bytes += block.arena_bytes();
                stats.largest_block = stats.largest_block.max(block.len());
            }
        }
        stats
    }
}

impl<V: AtomicValue + fmt::Debug> fmt::Debug for LockfreeStrMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over the entries of a [`LockfreeStrMap`].
pub struct Iter<'a, V: AtomicValue> {
    table: &'a BucketTable<V>,
    next_bucket: usize,
    block: Option<Arc<Block<V>>>,
    pos: usize,
}

impl<V: AtomicValue> Iterator for Iter<'_, V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(block) = &self.block {
                if self.pos < block.len() {
                    let (key, value) = block.entry(self.pos);
                    self.pos += 1;
                    return Some((key.to_owned(), value));
                }
            }

            if self.next_bucket >= self.table.capacity() {
                self.block = None;
                return None;
            }
            self.block = self.table.load_full(self.next_bucket);
            self.next_bucket += 1;
            self.pos = 0;
        }
    }
}
