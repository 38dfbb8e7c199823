//! Heap tagging walker
//!
//! Drives full or class-filtered heap enumerations over the [`HeapAccess`]
//! capability: a clear pass zeroes every tag slot, a tagging pass assigns
//! fresh epoch-scoped tags to untagged objects and records them in a
//! [`TagCollector`], and resolution maps the recorded tags back to live
//! references. The multi-class filtered walk composes one tagging pass per
//! class under its own epoch and concatenates the resolved references.
//!
//! Every operation runs synchronously on the calling thread and either
//! completes or fails outright; there is no cancellation, timeout, or
//! retry. References the walker acquires are released on every exit path
//! unless they are handed to the caller.

use crate::allocator::TagAllocator;
use crate::collector::TagCollector;
use crate::snapshot::{encode, SnapshotEntry};
use heapwalk_core::{
    BufferLimits, ClassId, HeapAccess, HeapWalkError, ObjectRef, Result, Tag, Visit,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Slack added on top of the first batch when seeding the reference buffer.
const REF_SEED_SLACK: usize = 64;

/// Pass-local accumulator for resolved object references.
///
/// Owns every reference it holds: on drop, anything not handed out via
/// [`into_refs`](Self::into_refs) goes back to the runtime. Growth doubles
/// the capacity and always covers at least the incoming batch; a failed
/// growth releases the batch, latches the buffer, and reports an
/// allocation failure.
struct RefBuffer {
    heap: Arc<dyn HeapAccess>,
    refs: Vec<ObjectRef>,
    limit: usize,
}

impl RefBuffer {
    fn new(heap: Arc<dyn HeapAccess>, limit: usize) -> RefBuffer {
        RefBuffer {
            heap,
            refs: Vec::new(),
            limit,
        }
    }

    /// Append one resolved batch, growing if needed.
    fn append_batch(&mut self, batch: Vec<ObjectRef>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let needed = self.refs.len() + batch.len();
        if needed > self.refs.capacity() {
            let target = if self.refs.capacity() == 0 {
                batch.len() + REF_SEED_SLACK
            } else {
                self.refs.capacity() * 2 + batch.len()
            };
            let grown = target <= self.limit
                && self
                    .refs
                    .try_reserve_exact(target - self.refs.len())
                    .is_ok();
            if !grown {
                for obj in batch {
                    self.heap.release(obj);
                }
                return Err(HeapWalkError::AllocationFailed {
                    context: "reference buffer",
                    requested: target,
                });
            }
        }
        self.refs.extend(batch);
        Ok(())
    }

    fn len(&self) -> usize {
        self.refs.len()
    }

    /// Hand the accumulated references to the caller, transferring
    /// ownership out of the buffer.
    fn into_refs(mut self) -> Vec<ObjectRef> {
        std::mem::take(&mut self.refs)
    }
}

impl Drop for RefBuffer {
    fn drop(&mut self) {
        for obj in self.refs.drain(..) {
            self.heap.release(obj);
        }
    }
}

/// Heap tagging walker over a runtime heap capability.
///
/// The allocator is shared with whoever else issues or validates tags
/// (typically the composition root); the walker never reaches for a
/// global.
pub struct HeapWalker {
    heap: Arc<dyn HeapAccess>,
    allocator: Arc<TagAllocator>,
    limits: BufferLimits,
}

impl HeapWalker {
    /// Create a walker with default buffer limits.
    pub fn new(heap: Arc<dyn HeapAccess>, allocator: Arc<TagAllocator>) -> HeapWalker {
        HeapWalker::with_limits(heap, allocator, BufferLimits::default())
    }

    /// Create a walker with explicit buffer limits.
    pub fn with_limits(
        heap: Arc<dyn HeapAccess>,
        allocator: Arc<TagAllocator>,
        limits: BufferLimits,
    ) -> HeapWalker {
        HeapWalker {
            heap,
            allocator,
            limits,
        }
    }

    /// Zero the tag slot of every heap object that carries a non-zero tag.
    ///
    /// Run before a fresh tagging pass so stale tags from a previous pass
    /// cannot leak into a new snapshot. Idempotent: clearing an already
    /// clear heap is a no-op.
    pub fn clear_all(&self) -> Result<()> {
        self.heap.iterate(None, &mut |slot| {
            if !slot.is_untagged() {
                *slot = Tag::UNTAGGED;
            }
            Visit::Continue
        })
    }

    /// Run one tagging pass, optionally scoped to a single class.
    ///
    /// Resets the local counter behind a fence, then assigns a fresh tag to
    /// every visited object whose slot is zero. Objects already carrying a
    /// non-zero tag are left untouched. A collector growth failure aborts
    /// the iteration and fails the whole pass; the partial collector is
    /// never returned.
    pub fn tag_pass(&self, filter: Option<ClassId>) -> Result<TagCollector> {
        self.allocator.begin_pass();

        let mut collector = TagCollector::new(self.limits.max_tag_entries);
        {
            let allocator = &self.allocator;
            let collector = &mut collector;
            self.heap.iterate(filter, &mut |slot| {
                if !slot.is_untagged() {
                    return Visit::Continue;
                }
                let tag = allocator.next_tag();
                *slot = tag;
                match collector.push(tag) {
                    Ok(()) => Visit::Continue,
                    Err(_) => Visit::Abort,
                }
            })?;
        }

        if collector.has_failed() {
            warn!(
                target: "heapwalk::walker",
                collected = collector.len(),
                "tagging pass aborted: collector growth failed"
            );
            return Err(HeapWalkError::AllocationFailed {
                context: "tag collector",
                requested: collector.len(),
            });
        }

        debug!(
            target: "heapwalk::walker",
            tagged = collector.len(),
            epoch = self.allocator.current_epoch(),
            "tagging pass complete"
        );
        Ok(collector)
    }

    /// Resolve freshly assigned tags back to live references.
    ///
    /// May return fewer pairs than input tags when the runtime reports
    /// fewer matches.
    pub fn resolve_tagged(&self, tags: &[Tag]) -> Result<Vec<(ObjectRef, Tag)>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        self.heap.objects_with_tags(tags)
    }

    /// Clear all tags, tag the entire heap, and hand every resolved
    /// reference to the caller. An empty heap yields an empty vector.
    pub fn walk_heap(&self) -> Result<Vec<ObjectRef>> {
        self.clear_all()?;
        let collector = self.tag_pass(None)?;
        if collector.is_empty() {
            return Ok(Vec::new());
        }
        let resolved = self.resolve_tagged(collector.tags())?;
        Ok(resolved.into_iter().map(|(obj, _)| obj).collect())
    }

    /// Multi-class filtered walk.
    ///
    /// For each class name in order: resolve the class (unresolved classes
    /// are skipped with a diagnostic, not fatal), advance the epoch so the
    /// class gets its own identifier namespace, run a scoped tagging pass,
    /// resolve the tags, and append the references to a shared buffer.
    /// Duplicate class names are walked once. Any allocation or capability
    /// failure aborts the entire operation and releases every reference
    /// collected so far; there is no partial result.
    ///
    /// Tags from earlier passes are deliberately not cleared first; the
    /// per-class epoch bump keeps new tags distinct from stale ones.
    pub fn walk_heap_filtered<S: AsRef<str>>(&self, class_names: &[S]) -> Result<Vec<ObjectRef>> {
        let mut collected = RefBuffer::new(Arc::clone(&self.heap), self.limits.max_ref_entries);

        let mut seen = Vec::new();
        for name in class_names {
            let name = name.as_ref();
            if seen.iter().any(|walked: &String| walked.as_str() == name) {
                continue;
            }
            seen.push(name.to_string());

            let Some(class) = self.heap.find_class(name) else {
                warn!(
                    target: "heapwalk::walker",
                    class = name,
                    "skipping unresolved class in filtered walk"
                );
                continue;
            };

            self.allocator.advance_epoch();
            let collector = self.tag_pass(Some(class))?;
            if collector.is_empty() {
                continue;
            }

            let resolved = self.resolve_tagged(collector.tags())?;
            let batch: Vec<ObjectRef> = resolved.into_iter().map(|(obj, _)| obj).collect();
            collected.append_batch(batch)?;
        }

        debug!(
            target: "heapwalk::walker",
            classes = seen.len(),
            found = collected.len(),
            "filtered walk complete"
        );
        Ok(collected.into_refs())
    }

    /// Build the wire-format snapshot for one class.
    ///
    /// Clears all tags, tags instances of `class_name`, resolves them, maps
    /// each to its class display name (best effort: an unreadable name
    /// degrades that entry to an empty string), and encodes the result.
    /// Fails on an unresolved class, an allocation failure, or a snapshot
    /// that would exceed the representable output size.
    pub fn snapshot_bytes(&self, class_name: &str) -> Result<Vec<u8>> {
        self.clear_all()?;

        let class = self
            .heap
            .find_class(class_name)
            .ok_or_else(|| HeapWalkError::ClassNotFound(class_name.to_string()))?;

        let collector = self.tag_pass(Some(class))?;
        let resolved = self.resolve_tagged(collector.tags())?;

        let mut entries = Vec::new();
        if entries.try_reserve_exact(resolved.len()).is_err() {
            for (obj, _) in resolved {
                self.heap.release(obj);
            }
            return Err(HeapWalkError::AllocationFailed {
                context: "snapshot entries",
                requested: collector.len(),
            });
        }
        for (obj, tag) in resolved {
            let name = match self.heap.class_name(&obj) {
                Ok(name) => name,
                Err(err) => {
                    debug!(
                        target: "heapwalk::walker",
                        tag = %tag,
                        error = %err,
                        "class name unavailable, degrading entry to empty name"
                    );
                    String::new()
                }
            };
            entries.push(SnapshotEntry::new(tag, name));
            self.heap.release(obj);
        }

        encode(&entries)
    }
}
