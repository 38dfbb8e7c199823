//! High-level heap agent surface
//!
//! [`HeapAgent`] wires one allocator, one walker, and one resolver over a
//! shared heap capability and exposes the operation set a migration driver
//! calls: single-class snapshots, full and filtered heap walks, tag
//! resolution, and epoch advancement.

use crate::allocator::TagAllocator;
use crate::resolver::TagResolver;
use crate::snapshot::HeapSnapshot;
use crate::walker::HeapWalker;
use heapwalk_core::{BufferLimits, HeapAccess, ObjectRef, Result, Tag, WalkMode};
use std::sync::Arc;

/// Composition root for the heap tagging core.
///
/// All operations execute synchronously on the calling thread and block
/// until the underlying heap walk completes. The agent owns no threads
/// and takes no locks; the shared epoch and local counter are the only
/// cross-call state.
pub struct HeapAgent {
    allocator: Arc<TagAllocator>,
    walker: HeapWalker,
    resolver: TagResolver,
}

impl HeapAgent {
    /// Create an agent over a heap capability with default buffer limits.
    pub fn new(heap: Arc<dyn HeapAccess>) -> HeapAgent {
        HeapAgent::with_limits(heap, BufferLimits::default())
    }

    /// Create an agent with explicit buffer limits.
    pub fn with_limits(heap: Arc<dyn HeapAccess>, limits: BufferLimits) -> HeapAgent {
        let allocator = Arc::new(TagAllocator::new());
        HeapAgent {
            walker: HeapWalker::with_limits(
                Arc::clone(&heap),
                Arc::clone(&allocator),
                limits,
            ),
            resolver: TagResolver::new(heap),
            allocator,
        }
    }

    /// Wire-format snapshot of all live instances of one class.
    ///
    /// See [`HeapWalker::snapshot_bytes`] for the full contract.
    pub fn snapshot_bytes(&self, class_name: &str) -> Result<Vec<u8>> {
        self.walker.snapshot_bytes(class_name)
    }

    /// Decoded snapshot of all live instances of one class.
    pub fn snapshot(&self, class_name: &str) -> Result<HeapSnapshot> {
        Ok(HeapSnapshot::from_bytes(&self.snapshot_bytes(class_name)?))
    }

    /// Resolve a previously issued tag to a live reference, or `None` when
    /// the object is gone or the tag was never issued.
    pub fn resolve(&self, tag: Tag) -> Result<Option<ObjectRef>> {
        self.resolver.resolve(tag)
    }

    /// Clear all tags, tag the entire heap, and return every live object.
    pub fn walk_heap(&self) -> Result<Vec<ObjectRef>> {
        self.walker.walk_heap()
    }

    /// Walk only instances of the listed classes. Unresolved classes are
    /// skipped; an empty result means nothing matched.
    pub fn walk_heap_filtered<S: AsRef<str>>(&self, class_names: &[S]) -> Result<Vec<ObjectRef>> {
        self.walker.walk_heap_filtered(class_names)
    }

    /// Discover objects using the configured heap walk strategy.
    ///
    /// [`WalkMode::Full`] ignores the class list and walks everything;
    /// [`WalkMode::Filtered`] walks only the listed classes.
    pub fn discover<S: AsRef<str>>(
        &self,
        mode: WalkMode,
        class_names: &[S],
    ) -> Result<Vec<ObjectRef>> {
        match mode {
            WalkMode::Full => self.walk_heap(),
            WalkMode::Filtered => self.walk_heap_filtered(class_names),
        }
    }

    /// Advance the epoch, invalidating the freshness of every previously
    /// issued tag. Called after a migration round completes. Returns the
    /// new epoch.
    pub fn advance_epoch(&self) -> u64 {
        self.allocator.advance_epoch()
    }

    /// Current epoch value.
    pub fn current_epoch(&self) -> u64 {
        self.allocator.current_epoch()
    }

    /// Whether a tag was issued under the current epoch.
    pub fn is_current(&self, tag: Tag) -> bool {
        self.allocator.is_current(tag)
    }
}
