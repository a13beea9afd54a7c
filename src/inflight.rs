//! In-flight partition token tracking
//!
//! A token present in the set is owned by exactly one outstanding operation.
//! Entries are only added through [`TokenSet::add_if_not_present`] and only
//! removed through [`TokenSet::delete`].
//!
//! The set is split into independently locked shards keyed by `token % SHARDS`
//! so that workers touching different partitions rarely contend.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SHARDS: usize = 256;

/// Concurrent set of partition tokens currently owned by an operation
#[derive(Debug)]
pub struct TokenSet {
    shards: Vec<Mutex<HashSet<u64>>>,
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSet {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashSet::new())).collect(),
        }
    }

    /// Insert `token` and report whether it was newly inserted
    ///
    /// `false` means another operation already owns the token.
    pub fn add_if_not_present(&self, token: u64) -> bool {
        self.shard(token).insert(token)
    }

    /// Remove `token`, a no-op if it is absent
    pub fn delete(&self, token: u64) {
        let mut shard = self.shard(token);
        shard.remove(&token);
        // Release memory held by a shard that spiked and drained again.
        if shard.is_empty() && shard.capacity() > 1024 {
            shard.shrink_to_fit();
        }
    }

    pub fn contains(&self, token: u64) -> bool {
        self.shard(token).contains(&token)
    }

    /// Number of tokens currently in flight
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard(&self, token: u64) -> MutexGuard<'_, HashSet<u64>> {
        self.shards[(token % SHARDS as u64) as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_add_then_delete() {
        let set = TokenSet::new();
        assert!(set.add_if_not_present(42));
        assert!(!set.add_if_not_present(42));
        assert!(set.contains(42));

        set.delete(42);
        assert!(!set.contains(42));
        assert!(set.add_if_not_present(42));
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let set = TokenSet::new();
        set.delete(7);
        set.delete(7);
        assert!(set.is_empty());
    }

    #[test]
    fn test_tokens_in_same_shard_are_distinct() {
        let set = TokenSet::new();
        assert!(set.add_if_not_present(1));
        assert!(set.add_if_not_present(1 + SHARDS as u64));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_concurrent_add_single_winner() {
        let set = Arc::new(TokenSet::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let set = Arc::clone(&set);
                let winners = Arc::clone(&winners);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if set.add_if_not_present(0xdead_beef) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(!set.add_if_not_present(0xdead_beef));
    }
}
