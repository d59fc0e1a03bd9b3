//! Host integration traits
//!
//! The engine never touches an object model directly. A host (an editor, a
//! project loader, a test fixture) implements these traits and the engine
//! only calls them from the thread that drives the session.

use crate::types::ObjectKind;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::path::Path;

/// Identity and metadata of host objects
pub trait ObjectModel {
    /// Opaque identity handle. Equality is object identity.
    type Handle: Clone + Eq + Hash + Debug;

    /// False once the object behind `handle` has been destroyed
    fn is_alive(&self, handle: &Self::Handle) -> bool;

    fn kind(&self, handle: &Self::Handle) -> ObjectKind;

    fn display_name(&self, handle: &Self::Handle) -> String;
}

/// Sources of scan candidates
pub trait CorpusProvider: ObjectModel {
    /// Load the main object of an asset file. `None` if it cannot be loaded.
    fn load_asset(&self, path: &Path) -> Option<Self::Handle>;

    /// All live instances that can hold references, at the time of the call
    fn live_instances(&self) -> Vec<Self::Handle>;
}

/// Dependency introspection primitives
pub trait DependencyIntrospector: ObjectModel {
    /// Everything `root` depends on, transitively. May include `root` itself.
    fn collect_dependencies(&self, root: &Self::Handle) -> Vec<Self::Handle>;

    /// Calls `visitor` with the value of every reference-valued field of
    /// `candidate` until it returns `ControlFlow::Break`.
    fn for_each_reference_field(
        &self,
        candidate: &Self::Handle,
        visitor: &mut dyn FnMut(&Self::Handle) -> ControlFlow<()>,
    );
}

/// Everything a scan session needs from its host
pub trait Host: CorpusProvider + DependencyIntrospector {}

impl<T: CorpusProvider + DependencyIntrospector> Host for T {}
