//! Growable tag collector for a single tagging pass
//!
//! The collector is the sink handed to the heap iteration visitor: every
//! freshly assigned tag is appended here. Capacity grows by doubling from a
//! fixed baseline. Growth goes through `try_reserve_exact` and a
//! configurable element limit; if either fails the collector latches into a
//! permanent failure state, keeps whatever it already holds, and reports
//! the failure. The owning pass must treat that as a hard abort; partial
//! contents are never surfaced to a caller.

use heapwalk_core::{HeapWalkError, Result, Tag};

/// Baseline capacity for the first growth step.
pub const INITIAL_CAPACITY: usize = 128;

/// Pass-local growable array of freshly assigned tags.
///
/// Single-owner and ephemeral: created at the start of a tagging pass,
/// consumed (or discarded) before the pass returns.
#[derive(Debug)]
pub struct TagCollector {
    tags: Vec<Tag>,
    limit: usize,
    failed: bool,
}

impl TagCollector {
    /// Create a collector bounded by `limit` entries.
    pub fn new(limit: usize) -> TagCollector {
        TagCollector {
            tags: Vec::new(),
            limit,
            failed: false,
        }
    }

    /// Append one tag, growing the backing storage if needed.
    ///
    /// After the first failure every subsequent call fails without
    /// mutating the collector.
    pub fn push(&mut self, tag: Tag) -> Result<()> {
        if self.failed {
            return Err(self.failure());
        }
        if self.tags.len() == self.tags.capacity() {
            let target = if self.tags.capacity() == 0 {
                INITIAL_CAPACITY
            } else {
                self.tags.capacity() * 2
            };
            let grown = target <= self.limit
                && self
                    .tags
                    .try_reserve_exact(target - self.tags.len())
                    .is_ok();
            if !grown {
                self.failed = true;
                return Err(HeapWalkError::AllocationFailed {
                    context: "tag collector",
                    requested: target,
                });
            }
        }
        self.tags.push(tag);
        Ok(())
    }

    /// Collected tags in assignment order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Number of tags collected so far.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True when nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// True once a growth failure has latched.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn failure(&self) -> HeapWalkError {
        HeapWalkError::AllocationFailed {
            context: "tag collector",
            requested: self.tags.capacity(),
        }
    }
}
