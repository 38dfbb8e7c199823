//! Core types and traits for heapwalk
//!
//! This crate defines the foundational pieces used throughout the system:
//! - Tag: epoch-scoped 64-bit object identifier
//! - HeapWalkError / Result: error type hierarchy
//! - BufferLimits: element-count limits for pass-local buffers
//! - HeapAccess: capability trait for the managed runtime's heap
//! - ObjectRef / ClassId: opaque runtime handles
//! - WalkMode: heap discovery strategy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod heap;
pub mod limits;
pub mod tag;

// Re-export commonly used types and traits
pub use error::{HeapWalkError, Result};
pub use heap::{ClassId, HeapAccess, ObjectRef, Visit, WalkMode};
pub use limits::BufferLimits;
pub use tag::Tag;
