//! Heap tagging agent
//!
//! The working half of heapwalk: tag allocation and epoch control, the
//! growable tag collector, the heap tagging walker, the snapshot wire
//! codec, the tag resolver, and the [`HeapAgent`] composition root that
//! exposes them as one operation surface. The managed runtime's heap is
//! reached only through the `HeapAccess` trait from `heapwalk-core`; an
//! in-memory mock lives in [`testing`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod allocator;
pub mod collector;
pub mod resolver;
pub mod snapshot;
pub mod testing;
pub mod walker;

// Re-export the operation surface
pub use agent::HeapAgent;
pub use allocator::TagAllocator;
pub use collector::TagCollector;
pub use resolver::TagResolver;
pub use snapshot::{encode, HeapSnapshot, SnapshotEntry, MAX_SNAPSHOT_BYTES};
pub use walker::HeapWalker;
