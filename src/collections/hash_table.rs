//! Hash Table - Fixed array of independently locked buckets
//!
//! Every bucket is a [`LinkedList`] behind its own mutex. An entry with
//! key `k` lives only in bucket `hash(k) % bucket_count`, so operations on
//! different buckets never contend and there is no table-wide lock.
//!
//! The bucket count is fixed at construction; the table never rehashes.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use parking_lot::Mutex;

use super::linked_list::{Finder, LinkedList};
use crate::error::{Result, ThreadError};

// ============================================================================
// Table Operations
// ============================================================================

/// Key extraction and hashing for entries of type `T`
///
/// The [`Finder`] half disambiguates entries that share a bucket.
pub trait TableOps<T>: Finder<T> + Clone {
    /// The key an entry is filed under
    fn key_of<'a>(&self, elem: &'a T) -> &'a Self::Key;

    /// Hash a key; the table reduces it modulo the bucket count
    fn hash(&self, key: &Self::Key) -> usize;
}

// ============================================================================
// Hash Table
// ============================================================================

type Bucket<T, O> = Mutex<LinkedList<T, O>>;

/// A bucket-locked hash table
pub struct HashTable<T, O> {
    buckets: Box<[Bucket<T, O>]>,
    ops: O,
}

impl<T, O: TableOps<T>> HashTable<T, O> {
    /// Create a table with `bucket_count` empty buckets
    pub fn init(bucket_count: usize, ops: O) -> Result<Self> {
        if bucket_count == 0 {
            return Err(ThreadError::InvalidArgument("bucket count is zero"));
        }

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(bucket_count)
            .map_err(|_| ThreadError::OutOfMemory)?;
        buckets.extend((0..bucket_count).map(|_| Mutex::new(LinkedList::new(ops.clone()))));

        Ok(Self {
            buckets: buckets.into_boxed_slice(),
            ops,
        })
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket that `key` maps to
    pub fn bucket_index(&self, key: &O::Key) -> usize {
        self.ops.hash(key) % self.buckets.len()
    }

    fn bucket(&self, key: &O::Key) -> &Bucket<T, O> {
        &self.buckets[self.bucket_index(key)]
    }

    /// File `entry` under its key's bucket
    pub fn insert(&self, entry: T) {
        let bucket = self.bucket(self.ops.key_of(&entry));
        bucket.lock().insert(entry);
    }

    /// Remove and return the entry matching `key`
    pub fn remove(&self, key: &O::Key) -> Option<T> {
        self.bucket(key).lock().remove(key)
    }

    /// Run `f` on the entry matching `key` while its bucket is locked
    ///
    /// Other callers on the same bucket park until `f` returns. `f` must
    /// not touch the same bucket again or it deadlocks.
    pub fn with<R>(&self, key: &O::Key, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.bucket(key).lock().lookup(key).map(f)
    }

    /// Number of entries across all buckets
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.lock().len()).sum()
    }

    /// Check if every bucket is empty
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.lock().is_empty())
    }

    /// Check whether bucket `index` is locked right now
    pub fn bucket_is_locked(&self, index: usize) -> bool {
        self.buckets
            .get(index)
            .is_some_and(|bucket| bucket.is_locked())
    }

    /// Empty every bucket, returning how many entries were dropped
    pub fn clear(&self) -> usize {
        self.buckets
            .iter()
            .map(|bucket| {
                let mut list = bucket.lock();
                let count = list.len();
                list.init();
                count
            })
            .sum()
    }
}

impl<T: Clone, O: TableOps<T>> HashTable<T, O> {
    /// Copy of the entry matching `key`
    pub fn lookup(&self, key: &O::Key) -> Option<T> {
        self.with(key, T::clone)
    }

    /// Scan every bucket for the first entry accepted by `pred`
    ///
    /// Buckets are locked one at a time.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        self.buckets
            .iter()
            .find_map(|bucket| bucket.lock().iter().find(|entry| pred(entry)).cloned())
    }
}

impl<T, O> fmt::Debug for HashTable<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("bucket_count", &self.buckets.len())
            .finish()
    }
}
