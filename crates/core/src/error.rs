//! Error types for the heap tagging core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. No operation panics across the public boundary; every
//! failure is reported through [`HeapWalkError`] and no operation is
//! automatically retried.

use std::io;
use thiserror::Error;

/// Result type alias for heap walk operations
pub type Result<T> = std::result::Result<T, HeapWalkError>;

/// Error types for the heap tagging core
#[derive(Debug, Error)]
pub enum HeapWalkError {
    /// Buffer or output allocation failure.
    ///
    /// Always aborts the current operation; partial results collected
    /// before the failure are never surfaced.
    #[error("Allocation failure in {context} (requested {requested} entries)")]
    AllocationFailed {
        /// Which buffer failed to grow
        context: &'static str,
        /// Capacity that could not be satisfied, in entries
        requested: usize,
    },

    /// Target class could not be resolved in the runtime.
    ///
    /// Fatal for a single-class snapshot; skipped per class during a
    /// multi-class filtered walk.
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// Encoded snapshot would exceed the representable output size.
    ///
    /// Detected in the sizing pre-pass, before any large allocation.
    #[error("Snapshot size {computed} exceeds limit {limit}")]
    SnapshotTooLarge {
        /// Computed total size in bytes
        computed: u64,
        /// Maximum representable size in bytes
        limit: u64,
    },

    /// The external heap capability reported a failure
    /// (heap iteration, batch tag resolution).
    #[error("Heap capability failure during {op}: {detail}")]
    Capability {
        /// Capability operation that failed
        op: &'static str,
        /// Runtime-provided failure description
        detail: String,
    },

    /// I/O error while assembling the snapshot buffer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HeapWalkError {
    /// Create a capability failure with diagnostic context.
    pub fn capability(op: &'static str, detail: impl Into<String>) -> Self {
        HeapWalkError::Capability {
            op,
            detail: detail.into(),
        }
    }
}
