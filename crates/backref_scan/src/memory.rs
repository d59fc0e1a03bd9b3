//! In-memory host
//!
//! A small object model for embedding the engine where objects already live in
//! memory, and for exercising the scheduler without a real project on disk.
//! Asset paths still have to exist on disk for the corpus walk to find them;
//! `load_asset` then maps the path to the registered object.

use crate::host::{CorpusProvider, DependencyIntrospector, ObjectModel};
use crate::types::ObjectKind;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Identity of an object in a [`MemoryHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Introspection call observed by the host, in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCall {
    Dependencies(ObjectId),
    Fields(ObjectId),
}

#[derive(Debug)]
struct MemoryObject {
    name: String,
    kind: ObjectKind,
    alive: bool,
    dependencies: Vec<ObjectId>,
    fields: Vec<Option<ObjectId>>,
}

/// Object model held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryHost {
    objects: Vec<MemoryObject>,
    assets: HashMap<PathBuf, ObjectId>,
    live: Vec<ObjectId>,
    calls: RefCell<Vec<ProbeCall>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object that is neither an asset file nor a live instance
    pub fn add_object(&mut self, name: &str, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(MemoryObject {
            name: name.to_string(),
            kind,
            alive: true,
            dependencies: Vec::new(),
            fields: Vec::new(),
        });
        id
    }

    /// Register the main object of the asset file at `path`
    pub fn add_asset(&mut self, path: impl Into<PathBuf>, name: &str, kind: ObjectKind) -> ObjectId {
        let id = self.add_object(name, kind);
        self.assets.insert(path.into(), id);
        id
    }

    /// Register a live instance
    pub fn add_live(&mut self, name: &str, kind: ObjectKind) -> ObjectId {
        let id = self.add_object(name, kind);
        self.live.push(id);
        id
    }

    /// `from` directly depends on `to`
    pub fn add_dependency(&mut self, from: ObjectId, to: ObjectId) {
        if let Some(obj) = self.objects.get_mut(from.0 as usize) {
            obj.dependencies.push(to);
        }
    }

    /// Append a reference-valued field to `owner`
    pub fn add_field(&mut self, owner: ObjectId, value: Option<ObjectId>) {
        if let Some(obj) = self.objects.get_mut(owner.0 as usize) {
            obj.fields.push(value);
        }
    }

    /// Destroy an object. Handles to it become stale.
    pub fn destroy(&mut self, id: ObjectId) {
        if let Some(obj) = self.objects.get_mut(id.0 as usize) {
            obj.alive = false;
        }
        self.live.retain(|l| *l != id);
    }

    /// Introspection calls made so far
    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn object(&self, id: &ObjectId) -> Option<&MemoryObject> {
        self.objects.get(id.0 as usize).filter(|o| o.alive)
    }
}

impl ObjectModel for MemoryHost {
    type Handle = ObjectId;

    fn is_alive(&self, handle: &ObjectId) -> bool {
        self.object(handle).is_some()
    }

    fn kind(&self, handle: &ObjectId) -> ObjectKind {
        self.objects
            .get(handle.0 as usize)
            .map(|o| o.kind.clone())
            .unwrap_or_else(|| ObjectKind::Other("Missing".to_string()))
    }

    fn display_name(&self, handle: &ObjectId) -> String {
        self.objects
            .get(handle.0 as usize)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| handle.to_string())
    }
}

impl CorpusProvider for MemoryHost {
    fn load_asset(&self, path: &Path) -> Option<ObjectId> {
        let id = self.assets.get(path)?;
        self.object(id).map(|_| *id)
    }

    fn live_instances(&self) -> Vec<ObjectId> {
        self.live
            .iter()
            .copied()
            .filter(|id| self.object(id).is_some())
            .collect()
    }
}

impl DependencyIntrospector for MemoryHost {
    fn collect_dependencies(&self, root: &ObjectId) -> Vec<ObjectId> {
        self.calls.borrow_mut().push(ProbeCall::Dependencies(*root));

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([*root]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let Some(obj) = self.object(&id) else {
                continue;
            };
            order.push(id);
            queue.extend(obj.dependencies.iter().copied());
        }
        order
    }

    fn for_each_reference_field(
        &self,
        candidate: &ObjectId,
        visitor: &mut dyn FnMut(&ObjectId) -> ControlFlow<()>,
    ) {
        self.calls.borrow_mut().push(ProbeCall::Fields(*candidate));

        let Some(obj) = self.object(candidate) else {
            return;
        };
        for value in obj.fields.iter().flatten() {
            if visitor(value).is_break() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_are_transitive_and_include_root() {
        let mut host = MemoryHost::new();
        let a = host.add_object("a", ObjectKind::Prefab);
        let b = host.add_object("b", ObjectKind::Prefab);
        let c = host.add_object("c", ObjectKind::DataAsset);
        host.add_dependency(a, b);
        host.add_dependency(b, c);
        host.add_dependency(c, a);

        let deps = host.collect_dependencies(&a);
        assert_eq!(deps, vec![a, b, c]);
    }

    #[test]
    fn test_destroyed_objects_are_stale() {
        let mut host = MemoryHost::new();
        let live = host.add_live("component", ObjectKind::SceneComponent);
        assert_eq!(host.live_instances(), vec![live]);

        host.destroy(live);
        assert!(!host.is_alive(&live));
        assert!(host.live_instances().is_empty());
    }

    #[test]
    fn test_field_visit_stops_on_break() {
        let mut host = MemoryHost::new();
        let owner = host.add_live("owner", ObjectKind::SceneComponent);
        let x = host.add_object("x", ObjectKind::DataAsset);
        let y = host.add_object("y", ObjectKind::DataAsset);
        host.add_field(owner, None);
        host.add_field(owner, Some(x));
        host.add_field(owner, Some(y));

        let mut visited = Vec::new();
        host.for_each_reference_field(&owner, &mut |v| {
            visited.push(*v);
            ControlFlow::Break(())
        });
        assert_eq!(visited, vec![x]);
    }
}
