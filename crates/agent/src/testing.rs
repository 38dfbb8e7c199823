//! Testing utilities for the heap tagging core
//!
//! This module provides an in-memory stand-in for the managed runtime's
//! heap so the walker, resolver, and codec can be exercised without a real
//! runtime:
//!
//! - **MockHeap**: an object table with per-object tag slots implementing
//!   [`HeapAccess`], with fault injection for iteration and resolution
//!   failures and per-class name failures
//! - **Reference accounting**: every handle given out is tracked until it
//!   is released, so tests can assert that no operation leaks
//!   runtime-held references
//!
//! # Example
//!
//! ```ignore
//! use heapwalk_agent::testing::MockHeap;
//!
//! let heap = MockHeap::new();
//! let class = heap.register_class("service/model/OldUser");
//! let obj = heap.spawn(class);
//! assert!(heap.tag_of(obj).is_untagged());
//! ```

use heapwalk_core::{ClassId, HeapAccess, HeapWalkError, ObjectRef, Result, Tag, Visit};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// One simulated heap object: its class and its tag slot.
#[derive(Debug)]
struct MockObject {
    class: ClassId,
    tag: Tag,
}

#[derive(Debug, Default)]
struct MockHeapState {
    objects: Vec<MockObject>,
    /// Internal class names, indexed by `ClassId`
    classes: Vec<String>,
    /// Live handles given out and not yet released: handle -> object index
    handles: HashMap<u64, usize>,
    next_handle: u64,
    /// Classes whose display name lookups fail
    unnameable: HashSet<ClassId>,
    fail_iteration: bool,
    /// Number of `objects_with_tags` calls allowed before failing
    resolution_budget: Option<usize>,
    resolution_calls: usize,
}

/// In-memory heap model implementing [`HeapAccess`].
///
/// Objects are registered up front with a class; iteration visits them in
/// creation order, which keeps test expectations deterministic. Handles
/// returned from resolution are counted until released, so a test can
/// assert `outstanding_refs() == 0` to prove nothing leaked.
#[derive(Debug, Default)]
pub struct MockHeap {
    state: RwLock<MockHeapState>,
}

impl MockHeap {
    /// Create an empty mock heap.
    pub fn new() -> MockHeap {
        MockHeap::default()
    }

    /// Register a class by internal name (e.g. `service/model/OldUser`)
    /// and return its handle. The display name is the internal name with
    /// `/` replaced by `.`.
    pub fn register_class(&self, internal_name: &str) -> ClassId {
        let mut state = self.state.write();
        let id = ClassId::new(state.classes.len() as u64);
        state.classes.push(internal_name.to_string());
        id
    }

    /// Create one object of a class. Returns its index for later
    /// inspection.
    pub fn spawn(&self, class: ClassId) -> usize {
        let mut state = self.state.write();
        state.objects.push(MockObject {
            class,
            tag: Tag::UNTAGGED,
        });
        state.objects.len() - 1
    }

    /// Current tag of an object.
    pub fn tag_of(&self, object: usize) -> Tag {
        self.state.read().objects[object].tag
    }

    /// Overwrite an object's tag slot directly. Lets tests construct
    /// states a correct allocator would not produce, like duplicate tags.
    pub fn force_tag(&self, object: usize, tag: Tag) {
        self.state.write().objects[object].tag = tag;
    }

    /// Number of objects currently carrying a non-zero tag.
    pub fn tagged_count(&self) -> usize {
        self.state
            .read()
            .objects
            .iter()
            .filter(|obj| !obj.tag.is_untagged())
            .count()
    }

    /// Number of handles given out and not yet released.
    pub fn outstanding_refs(&self) -> usize {
        self.state.read().handles.len()
    }

    /// Make every subsequent heap iteration fail.
    pub fn fail_iteration(&self) {
        self.state.write().fail_iteration = true;
    }

    /// Allow `calls` successful `objects_with_tags` invocations, then fail
    /// every one after that.
    pub fn fail_resolution_after(&self, calls: usize) {
        self.state.write().resolution_budget = Some(calls);
    }

    /// Make display-name lookups fail for every object of `class`.
    pub fn fail_name_for(&self, class: ClassId) {
        self.state.write().unnameable.insert(class);
    }
}

impl HeapAccess for MockHeap {
    fn find_class(&self, internal_name: &str) -> Option<ClassId> {
        let state = self.state.read();
        state
            .classes
            .iter()
            .position(|name| name == internal_name)
            .map(|idx| ClassId::new(idx as u64))
    }

    fn iterate(
        &self,
        filter: Option<ClassId>,
        visit: &mut dyn FnMut(&mut Tag) -> Visit,
    ) -> Result<()> {
        let mut state = self.state.write();
        if state.fail_iteration {
            return Err(HeapWalkError::capability(
                "heap iteration",
                "injected iteration failure",
            ));
        }
        for object in state.objects.iter_mut() {
            if let Some(class) = filter {
                if object.class != class {
                    continue;
                }
            }
            if visit(&mut object.tag) == Visit::Abort {
                break;
            }
        }
        Ok(())
    }

    fn objects_with_tags(&self, tags: &[Tag]) -> Result<Vec<(ObjectRef, Tag)>> {
        let mut state = self.state.write();
        state.resolution_calls += 1;
        if let Some(budget) = state.resolution_budget {
            if state.resolution_calls > budget {
                return Err(HeapWalkError::capability(
                    "tag resolution",
                    "injected resolution failure",
                ));
            }
        }

        let wanted: HashSet<Tag> = tags.iter().copied().collect();
        let matches: Vec<(usize, Tag)> = state
            .objects
            .iter()
            .enumerate()
            .filter(|(_, obj)| wanted.contains(&obj.tag))
            .map(|(idx, obj)| (idx, obj.tag))
            .collect();

        let mut out = Vec::with_capacity(matches.len());
        for (idx, tag) in matches {
            let handle = state.next_handle;
            state.next_handle += 1;
            state.handles.insert(handle, idx);
            out.push((ObjectRef::new(handle), tag));
        }
        Ok(out)
    }

    fn class_name(&self, obj: &ObjectRef) -> Result<String> {
        let state = self.state.read();
        let idx = *state.handles.get(&obj.handle()).ok_or_else(|| {
            HeapWalkError::capability("class name lookup", "stale object handle")
        })?;
        let class = state.objects[idx].class;
        if state.unnameable.contains(&class) {
            return Err(HeapWalkError::capability(
                "class name lookup",
                "injected name failure",
            ));
        }
        let internal = &state.classes[class.id() as usize];
        Ok(internal.replace('/', "."))
    }

    fn release(&self, obj: ObjectRef) {
        self.state.write().handles.remove(&obj.handle());
    }
}
