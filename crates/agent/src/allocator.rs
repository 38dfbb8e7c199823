//! Tag allocation and epoch control
//!
//! The allocator owns the only persistent shared mutable state in the
//! system: the process-wide epoch and local counter pair. Both are plain
//! atomics; no locks are taken anywhere on the tagging path.
//!
//! # Memory Ordering
//!
//! `next_local` uses a sequentially consistent fetch-add so concurrent
//! passes never observe the same counter value. `begin_pass` places a
//! SeqCst fence before resetting the local counter so no tagging visitor
//! can observe a stale value from a previous pass. Epoch reads are Relaxed:
//! staleness only affects which generation a tag lands in, never the
//! uniqueness of tags within a pass.

use heapwalk_core::Tag;
use std::sync::atomic::{fence, AtomicU64, Ordering};

/// Atomic counter service composing epoch-scoped object tags.
///
/// Injected into the walker rather than accessed as a global; every
/// component that issues or interprets tags shares one allocator.
#[derive(Debug)]
pub struct TagAllocator {
    /// Coarse generation counter, bumped after each migration round
    epoch: AtomicU64,
    /// Per-pass counter, reset to 1 at the start of every tagging pass
    local: AtomicU64,
}

impl Default for TagAllocator {
    fn default() -> Self {
        TagAllocator::new()
    }
}

impl TagAllocator {
    /// Create an allocator with the epoch at its starting value of 1.
    pub fn new() -> TagAllocator {
        TagAllocator {
            epoch: AtomicU64::new(1),
            local: AtomicU64::new(1),
        }
    }

    /// Atomically take the next local counter value. Issues from 1 upward
    /// within a pass.
    pub fn next_local(&self) -> u64 {
        self.local.fetch_add(1, Ordering::SeqCst)
    }

    /// Current epoch value.
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Advance the epoch, invalidating the freshness of every previously
    /// issued tag. Returns the new epoch value. Strictly forward; called by
    /// the migration driver after a round completes, and once per class
    /// inside a multi-class filtered walk.
    pub fn advance_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Start a tagging pass: reset the local counter to 1 behind a full
    /// fence so the reset is visible before any object is tagged.
    pub fn begin_pass(&self) {
        fence(Ordering::SeqCst);
        self.local.store(1, Ordering::SeqCst);
    }

    /// Compose a fresh tag from the current epoch and the next local
    /// counter value.
    pub fn next_tag(&self) -> Tag {
        let local = self.next_local();
        Tag::compose(self.current_epoch(), local)
    }

    /// Whether a tag was issued under the current epoch.
    ///
    /// After [`advance_epoch`](Self::advance_epoch), every earlier tag
    /// reports stale here even though its stored value is untouched.
    pub fn is_current(&self, tag: Tag) -> bool {
        u64::from(tag.epoch()) == self.current_epoch() & 0xFFFF_FFFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_local_counter_issues_from_one() {
        let alloc = TagAllocator::new();
        assert_eq!(alloc.next_local(), 1);
        assert_eq!(alloc.next_local(), 2);
        assert_eq!(alloc.next_local(), 3);
    }

    #[test]
    fn test_begin_pass_resets_local_counter() {
        let alloc = TagAllocator::new();
        alloc.next_local();
        alloc.next_local();
        alloc.begin_pass();
        assert_eq!(alloc.next_local(), 1);
    }

    #[test]
    fn test_epoch_starts_at_one() {
        let alloc = TagAllocator::new();
        assert_eq!(alloc.current_epoch(), 1);
    }

    #[test]
    fn test_epoch_monotonicity() {
        let alloc = TagAllocator::new();
        let before = alloc.current_epoch();
        for i in 1..=5 {
            assert_eq!(alloc.advance_epoch(), before + i);
        }
        assert_eq!(alloc.current_epoch(), before + 5);
    }

    #[test]
    fn test_next_tag_composition() {
        let alloc = TagAllocator::new();
        alloc.advance_epoch(); // epoch 2
        alloc.begin_pass();
        let tag = alloc.next_tag();
        assert_eq!(tag.epoch(), 2);
        assert_eq!(tag.local(), 1);
        assert!(!tag.is_untagged());
    }

    #[test]
    fn test_is_current_tracks_epoch() {
        let alloc = TagAllocator::new();
        let tag = alloc.next_tag();
        assert!(alloc.is_current(tag));
        alloc.advance_epoch();
        assert!(!alloc.is_current(tag));
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let alloc = Arc::new(TagAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = Arc::clone(&alloc);
            handles.push(thread::spawn(move || {
                (0..1000).map(|_| alloc.next_local()).collect::<Vec<_>>()
            }));
        }

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate counter value {value}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
