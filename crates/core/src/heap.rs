//! Heap capability trait and opaque runtime handles
//!
//! The managed runtime's heap facilities are consumed exclusively through
//! [`HeapAccess`]. The trait covers the four primitives this core needs:
//! heap iteration with a per-object tag-slot visitor, batch tag-to-reference
//! resolution, reference release, and class lookup/naming. Everything else
//! (attach plumbing, capability negotiation) stays outside this crate.
//!
//! # Reference ownership
//!
//! An [`ObjectRef`] is an owned handle to a runtime-held reference. It is
//! deliberately neither `Copy` nor `Clone`: whoever holds one must either
//! hand it to a caller or give it back via [`HeapAccess::release`] exactly
//! once. The walker's buffers release every handle they still own on drop.

use crate::error::Result;
use crate::tag::Tag;

/// Opaque handle to a live object reference held by the runtime.
///
/// Obtained from [`HeapAccess::objects_with_tags`]; returned to the runtime
/// through [`HeapAccess::release`] unless handed to the caller.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// Wrap a runtime handle value. Used by capability implementations.
    pub fn new(handle: u64) -> ObjectRef {
        ObjectRef(handle)
    }

    /// The underlying handle value.
    pub fn handle(&self) -> u64 {
        self.0
    }
}

/// Opaque handle to a loaded runtime class, used to scope heap iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u64);

impl ClassId {
    /// Wrap a runtime class handle value.
    pub fn new(id: u64) -> ClassId {
        ClassId(id)
    }

    /// The underlying handle value.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Control value returned by a heap iteration visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep iterating.
    Continue,
    /// Stop the walk immediately; objects not yet visited stay untouched.
    Abort,
}

/// Heap discovery strategy for migration callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Walk the entire heap and return every live object. Comprehensive
    /// but pays the cost of a full enumeration.
    Full,
    /// Walk only objects of explicitly listed classes. Cheaper when the
    /// caller knows which classes hold the instances being migrated.
    Filtered,
}

/// Capability interface to the managed runtime's heap.
///
/// Implementations must be `Send + Sync`; tagging passes may be requested
/// from any thread. All operations run synchronously on the calling thread
/// and are expected to observe a consistent heap (the runtime pauses
/// mutators during iteration, not this core).
///
/// # Visitor contract
///
/// The iteration visitor receives each object's mutable tag slot. It must
/// not call back into the capability; implementations may hold internal
/// locks across the walk.
pub trait HeapAccess: Send + Sync {
    /// Resolve a class by its internal name (e.g. `service/model/OldUser`).
    ///
    /// Returns `None` when the class is not loaded.
    fn find_class(&self, internal_name: &str) -> Option<ClassId>;

    /// Enumerate heap objects, optionally restricted to instances of one
    /// class, invoking the visitor with each object's tag slot. Objects of
    /// either reference kind (strong or weak) are visited.
    ///
    /// A [`Visit::Abort`] from the visitor stops the walk without error;
    /// runtime-side iteration failures are reported as `Err`.
    fn iterate(
        &self,
        filter: Option<ClassId>,
        visit: &mut dyn FnMut(&mut Tag) -> Visit,
    ) -> Result<()>;

    /// Resolve previously assigned tags back to live references.
    ///
    /// Returns `(reference, tag)` pairs. The result may be shorter than the
    /// input when objects were collected in the meantime, and the contract
    /// permits more than one match per tag. Every returned reference is
    /// owned by the caller.
    fn objects_with_tags(&self, tags: &[Tag]) -> Result<Vec<(ObjectRef, Tag)>>;

    /// Best-effort display name for the class of a live reference
    /// (e.g. `service.model.OldUser`).
    fn class_name(&self, obj: &ObjectRef) -> Result<String>;

    /// Return a reference handle to the runtime.
    fn release(&self, obj: ObjectRef);
}
