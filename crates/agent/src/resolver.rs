//! Tag-to-reference resolution
//!
//! Maps a single previously issued tag back to a live object reference.
//! Independent of the walker; it shares only the identifier space.

use heapwalk_core::{HeapAccess, ObjectRef, Result, Tag};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves individual tags through the runtime's batch lookup capability.
pub struct TagResolver {
    heap: Arc<dyn HeapAccess>,
}

impl TagResolver {
    /// Create a resolver over a heap capability.
    pub fn new(heap: Arc<dyn HeapAccess>) -> TagResolver {
        TagResolver { heap }
    }

    /// Resolve one tag to a live reference.
    ///
    /// Returns `None` when the runtime reports no match (object collected,
    /// or the tag was never issued). The reserved zero tag is rejected
    /// here without touching the runtime: it is never issued, but it sits
    /// in every untagged slot and would match arbitrary objects. The batch
    /// capability may report more than one match for a tag; the first is
    /// kept and the rest are released immediately.
    pub fn resolve(&self, tag: Tag) -> Result<Option<ObjectRef>> {
        if tag.is_untagged() {
            return Ok(None);
        }
        let matches = self.heap.objects_with_tags(std::slice::from_ref(&tag))?;

        let mut iter = matches.into_iter();
        let first = iter.next().map(|(obj, _)| obj);
        let mut extras = 0usize;
        for (obj, _) in iter {
            self.heap.release(obj);
            extras += 1;
        }
        if extras > 0 {
            warn!(
                target: "heapwalk::resolver",
                tag = %tag,
                extras,
                "multiple objects matched one tag, kept first"
            );
        }

        if first.is_none() {
            debug!(target: "heapwalk::resolver", tag = %tag, "tag resolved to no object");
        }
        Ok(first)
    }
}
