//! Sharded accumulator for parallel ranking.
//!
//! Keys are spread over a fixed array of buckets, each an ordered map behind
//! its own lock. An update only ever takes the lock of the key's bucket, so at
//! most `1/B` of concurrent updates contend with each other.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Stable mapping of a key onto one of `count` buckets.
pub trait ShardKey: Copy + Ord {
    fn bucket(&self, count: usize) -> usize;
}

macro_rules! impl_shard_key_signed {
    ($($t:ty),*) => {$(
        impl ShardKey for $t {
            #[inline]
            fn bucket(&self, count: usize) -> usize {
                (*self as i128).rem_euclid(count as i128) as usize
            }
        }
    )*};
}

macro_rules! impl_shard_key_unsigned {
    ($($t:ty),*) => {$(
        impl ShardKey for $t {
            #[inline]
            fn bucket(&self, count: usize) -> usize {
                (*self as u128 % count as u128) as usize
            }
        }
    )*};
}

impl_shard_key_signed!(i8, i16, i32, i64, isize);
impl_shard_key_unsigned!(u8, u16, u32, u64, usize);

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: ShardKey,
    V: Copy + Default + AddAssign,
{
    /// Create a map with `bucket_count` buckets (at least one).
    pub fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count.max(1)).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { buckets }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_for(&self, key: &K) -> &Mutex<BTreeMap<K, V>> {
        &self.buckets[key.bucket(self.buckets.len())]
    }

    /// Add `delta` to the value under `key`, inserting `delta` if the key is new.
    /// Returns the updated value.
    pub fn add_or_update(&self, key: K, delta: V) -> V {
        let mut bucket = self.bucket_for(&key).lock();
        let value = bucket.entry(key).or_default();
        *value += delta;
        *value
    }

    pub fn erase(&self, key: K) -> Option<V> {
        self.bucket_for(&key).lock().remove(&key)
    }

    /// Fold every bucket into one ordered map. Meant to run once all
    /// concurrent updates have finished.
    pub fn merge(&self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for bucket in &self.buckets {
            let bucket = bucket.lock();
            merged.extend(bucket.iter().map(|(k, v)| (*k, *v)));
        }
        merged
    }

    /// Consuming variant of [`merge`](Self::merge) that avoids the locks.
    pub fn into_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for bucket in self.buckets {
            merged.append(&mut bucket.into_inner());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn add_or_update_inserts_then_accumulates() {
        let map: ConcurrentMap<i32, f64> = ConcurrentMap::new(4);
        assert_eq!(map.add_or_update(7, 0.5), 0.5);
        assert_eq!(map.add_or_update(7, 0.25), 0.75);
        let merged = map.merge();
        assert_eq!(merged.get(&7), Some(&0.75));
        assert_eq!(merged.get(&8), None);
    }

    #[test]
    fn erase_removes_key() {
        let map: ConcurrentMap<i32, f64> = ConcurrentMap::new(3);
        map.add_or_update(1, 1.0);
        map.add_or_update(2, 2.0);
        assert_eq!(map.erase(1), Some(1.0));
        assert_eq!(map.erase(1), None);
        assert_eq!(map.into_map().into_keys().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn negative_keys_land_in_range() {
        for key in [-1i32, -10, i32::MIN, 0, i32::MAX] {
            assert!(key.bucket(10) < 10);
        }
        assert_eq!((-1i32).bucket(10), 9);
    }

    #[test]
    fn zero_buckets_become_one() {
        let map: ConcurrentMap<u32, u64> = ConcurrentMap::new(0);
        assert_eq!(map.bucket_count(), 1);
        map.add_or_update(5, 1);
        assert_eq!(map.merge().get(&5), Some(&1));
    }

    #[test]
    fn merge_is_ordered() {
        let map: ConcurrentMap<i32, i64> = ConcurrentMap::new(3);
        for key in [9, 1, 5, 3, 7] {
            map.add_or_update(key, i64::from(key));
        }
        let keys: Vec<i32> = map.merge().into_keys().collect();
        assert_eq!(keys, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn concurrent_updates_on_overlapping_keys() {
        let map: ConcurrentMap<i32, u64> = ConcurrentMap::new(7);
        (0..10_000).into_par_iter().for_each(|i| {
            map.add_or_update(i % 100, 1);
        });
        let merged = map.into_map();
        assert_eq!(merged.len(), 100);
        assert!(merged.values().all(|&v| v == 100));
    }
}
