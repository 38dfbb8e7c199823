//! Size limits for pass-local collection buffers
//!
//! This module defines configurable element-count limits enforced by the
//! tag collector and the multi-class reference buffer. Growth past a limit
//! is reported as an allocation failure and aborts the in-progress pass,
//! exactly like a failed reservation from the system allocator.

/// Element-count limits for pass-local buffers
///
/// The defaults mirror the signed 32-bit counts of the runtime's heap
/// interface: no buffer ever holds more than `i32::MAX` entries. Tests
/// lower these limits to exercise allocation-failure paths at a chosen
/// append.
#[derive(Debug, Clone)]
pub struct BufferLimits {
    /// Maximum entries in a single tag collector (default: `i32::MAX`)
    pub max_tag_entries: usize,

    /// Maximum entries in the multi-class reference buffer (default: `i32::MAX`)
    pub max_ref_entries: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        BufferLimits {
            max_tag_entries: i32::MAX as usize,
            max_ref_entries: i32::MAX as usize,
        }
    }
}

impl BufferLimits {
    /// Set the tag collector limit.
    pub fn with_max_tag_entries(mut self, max: usize) -> Self {
        self.max_tag_entries = max;
        self
    }

    /// Set the reference buffer limit.
    pub fn with_max_ref_entries(mut self, max: usize) -> Self {
        self.max_ref_entries = max;
        self
    }
}
