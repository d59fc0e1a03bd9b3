//! Reference probes
//!
//! Two strategies, one per corpus:
//!
//! - Assets are checked against their full dependency collection. The host
//!   primitive is transitive, so an asset that reaches the target through
//!   another asset also counts. This is a known precision gap and is kept as-is.
//! - Live instances are checked field by field and only match a field whose
//!   value is the target itself.
//!
//! A candidate never references itself, and stale handles never match.

use crate::host::{DependencyIntrospector, ObjectModel};
use std::collections::HashSet;
use std::ops::ControlFlow;

/// True if `target` is in the dependency collection of the asset `candidate`
pub fn probe_asset<H: DependencyIntrospector>(
    host: &H,
    candidate: &H::Handle,
    target: &H::Handle,
) -> bool {
    if candidate == target || !both_alive(host, candidate, target) {
        return false;
    }
    host.collect_dependencies(candidate).contains(target)
}

/// True if one of the reference fields of the live `candidate` holds `target`
pub fn probe_live<H: DependencyIntrospector>(
    host: &H,
    candidate: &H::Handle,
    target: &H::Handle,
) -> bool {
    if candidate == target || !both_alive(host, candidate, target) {
        return false;
    }

    let mut found = false;
    host.for_each_reference_field(candidate, &mut |value| {
        if value == target {
            found = true;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    found
}

fn both_alive<H: ObjectModel>(host: &H, candidate: &H::Handle, target: &H::Handle) -> bool {
    host.is_alive(candidate) && host.is_alive(target)
}

/// Dependency collection of one asset, collected once and probed per target
#[derive(Debug)]
pub struct DependencySet<Handle> {
    candidate: Handle,
    dependencies: HashSet<Handle>,
}

impl<Handle> DependencySet<Handle>
where
    Handle: Clone + Eq + std::hash::Hash,
{
    pub fn collect<H>(host: &H, candidate: &Handle) -> Self
    where
        H: DependencyIntrospector<Handle = Handle>,
    {
        Self {
            candidate: candidate.clone(),
            dependencies: host.collect_dependencies(candidate).into_iter().collect(),
        }
    }

    pub fn candidate(&self) -> &Handle {
        &self.candidate
    }

    /// Same answer as [`probe_asset`] for this set's candidate
    pub fn references<H>(&self, host: &H, target: &Handle) -> bool
    where
        H: ObjectModel<Handle = Handle>,
    {
        if *target == self.candidate || !host.is_alive(target) {
            return false;
        }
        self.dependencies.contains(target)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use crate::types::ObjectKind;

    #[test]
    fn test_asset_probe_matches_dependency() {
        let mut host = MemoryHost::new();
        let target = host.add_object("Target", ObjectKind::DataAsset);
        let asset = host.add_object("Asset", ObjectKind::Prefab);
        let other = host.add_object("Other", ObjectKind::Prefab);
        host.add_dependency(asset, target);

        assert!(probe_asset(&host, &asset, &target));
        assert!(!probe_asset(&host, &other, &target));
    }

    #[test]
    fn test_asset_probe_is_transitive() {
        let mut host = MemoryHost::new();
        let target = host.add_object("Target", ObjectKind::DataAsset);
        let middle = host.add_object("Middle", ObjectKind::DataAsset);
        let outer = host.add_object("Outer", ObjectKind::Prefab);
        host.add_dependency(outer, middle);
        host.add_dependency(middle, target);

        assert!(probe_asset(&host, &outer, &target));
    }

    #[test]
    fn test_live_probe_is_direct_only() {
        let mut host = MemoryHost::new();
        let target = host.add_object("Target", ObjectKind::DataAsset);
        let middle = host.add_object("Middle", ObjectKind::DataAsset);
        host.add_dependency(middle, target);
        let live = host.add_live("Live", ObjectKind::SceneComponent);
        host.add_field(live, Some(middle));

        assert!(!probe_live(&host, &live, &target));
        assert!(probe_live(&host, &live, &middle));
    }

    #[test]
    fn test_self_reference_is_excluded() {
        let mut host = MemoryHost::new();
        let asset = host.add_object("Asset", ObjectKind::Prefab);
        host.add_dependency(asset, asset);
        let live = host.add_live("Live", ObjectKind::SceneComponent);
        host.add_field(live, Some(live));

        assert!(!probe_asset(&host, &asset, &asset));
        assert!(!probe_live(&host, &live, &live));
        assert!(!DependencySet::collect(&host, &asset).references(&host, &asset));
    }

    #[test]
    fn test_stale_handles_never_match() {
        let mut host = MemoryHost::new();
        let target = host.add_object("Target", ObjectKind::DataAsset);
        let live = host.add_live("Live", ObjectKind::SceneComponent);
        host.add_field(live, Some(target));
        assert!(probe_live(&host, &live, &target));

        host.destroy(target);
        assert!(!probe_live(&host, &live, &target));
    }

    #[test]
    fn test_dependency_set_agrees_with_probe() {
        let mut host = MemoryHost::new();
        let t1 = host.add_object("T1", ObjectKind::DataAsset);
        let t2 = host.add_object("T2", ObjectKind::DataAsset);
        let asset = host.add_object("Asset", ObjectKind::Prefab);
        host.add_dependency(asset, t1);

        let set = DependencySet::collect(&host, &asset);
        for target in [t1, t2, asset] {
            assert_eq!(
                set.references(&host, &target),
                probe_asset(&host, &asset, &target)
            );
        }
    }
}
