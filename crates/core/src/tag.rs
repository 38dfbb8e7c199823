//! Object tag identifiers
//!
//! A tag is a 64-bit handle attached to a live heap object so it can be
//! correlated across calls and across garbage collection cycles. Tags are
//! composed from two 32-bit halves:
//!
//! ```text
//! bits 63..32 : epoch (coarse generation, bumped after a migration round)
//! bits 31..0  : local counter (fresh per tagging pass, issued from 1)
//! ```
//!
//! The value 0 is reserved and means "untagged". It is never assigned to a
//! live object; a cleared tag slot holds [`Tag::UNTAGGED`].

use std::fmt;

/// Mask applied to each half before composition.
const HALF_MASK: u64 = 0xFFFF_FFFF;

/// A 64-bit object tag: `(epoch << 32) | local_counter`.
///
/// Both halves are masked to 32 bits on composition. A local counter that
/// wraps past 2^32 within a single pass can therefore collide; heap object
/// counts are assumed to stay well below that per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tag(u64);

impl Tag {
    /// The reserved "untagged" value. Never assigned to a live object.
    pub const UNTAGGED: Tag = Tag(0);

    /// Compose a tag from an epoch and a local counter value.
    ///
    /// Both inputs are masked to their low 32 bits before combination.
    pub fn compose(epoch: u64, local: u64) -> Tag {
        Tag(((epoch & HALF_MASK) << 32) | (local & HALF_MASK))
    }

    /// Reconstruct a tag from its raw 64-bit wire value.
    pub fn from_raw(raw: u64) -> Tag {
        Tag(raw)
    }

    /// The raw 64-bit value, as written to the wire.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// The epoch half (high 32 bits).
    pub fn epoch(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The local counter half (low 32 bits).
    pub fn local(self) -> u32 {
        self.0 as u32
    }

    /// True for the reserved untagged value.
    pub fn is_untagged(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.epoch(), self.local())
    }
}
