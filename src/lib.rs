//! Heapwalk - heap tagging and snapshot core for live-object migration
//!
//! Heapwalk assigns stable, epoch-scoped 64-bit tags to live objects in a
//! managed runtime's garbage-collected heap, encodes deterministic
//! big-endian snapshots of the tagged objects, and resolves tags back to
//! live references across collection cycles. The runtime's heap facilities
//! are consumed through the [`HeapAccess`] capability trait; nothing here
//! walks object graphs, mutates object contents, or persists snapshots.
//!
//! # Quick Start
//!
//! ```ignore
//! use heapwalk::{HeapAgent, Tag};
//! use std::sync::Arc;
//!
//! // `runtime_heap` implements heapwalk::HeapAccess
//! let agent = HeapAgent::new(Arc::new(runtime_heap));
//!
//! // Snapshot all live instances of one class
//! let snapshot = agent.snapshot("service/model/OldUser")?;
//! for entry in snapshot.entries() {
//!     let obj = agent.resolve(entry.tag)?;
//!     // migrate obj ...
//! }
//!
//! // Invalidate every issued tag once the round is done
//! agent.advance_epoch();
//! ```
//!
//! # Architecture
//!
//! Foundational types (tags, errors, limits, the capability trait) live in
//! `heapwalk-core`; the allocator, walker, snapshot codec, resolver, and
//! the [`HeapAgent`] composition root live in `heapwalk-agent`. This crate
//! re-exports the public API of both.

pub use heapwalk_agent::{
    encode, HeapAgent, HeapSnapshot, HeapWalker, SnapshotEntry, TagAllocator, TagCollector,
    TagResolver, MAX_SNAPSHOT_BYTES,
};
pub use heapwalk_core::{
    BufferLimits, ClassId, HeapAccess, HeapWalkError, ObjectRef, Result, Tag, Visit, WalkMode,
};

/// Testing utilities (in-memory mock heap with reference accounting)
pub use heapwalk_agent::testing;
