//! Result aggregation
//!
//! Confirmed references are sorted into three buckets by the runtime kind of
//! the referencing candidate. Recording is idempotent by identity, so the
//! inner target loop can report the same candidate several times.

use crate::host::ObjectModel;
use crate::types::{ObjectKind, ReferenceHit, ResultBucket};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::error;

/// What `record` did with a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Added(ResultBucket),
    /// Already recorded earlier in this session
    Duplicate(ResultBucket),
    /// Kind matches no bucket; logged and dropped
    Unrecognized(ObjectKind),
    /// Dropped as unrecognized earlier in this session
    AlreadyDropped,
    /// Handle was destroyed before it could be recorded
    Stale,
}

/// Three result buckets with identity deduplication
#[derive(Debug)]
pub struct ResultAggregator<Handle> {
    buckets: [Vec<ReferenceHit<Handle>>; 3],
    recorded: HashMap<Handle, ResultBucket>,
    dropped: HashSet<Handle>,
}

impl<Handle> Default for ResultAggregator<Handle> {
    fn default() -> Self {
        Self {
            buckets: [Vec::new(), Vec::new(), Vec::new()],
            recorded: HashMap::new(),
            dropped: HashSet::new(),
        }
    }
}

impl<Handle> ResultAggregator<Handle>
where
    Handle: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate that references at least one target
    pub fn record<H>(&mut self, host: &H, candidate: &Handle) -> RecordOutcome
    where
        H: ObjectModel<Handle = Handle>,
    {
        if let Some(bucket) = self.recorded.get(candidate) {
            return RecordOutcome::Duplicate(*bucket);
        }
        if self.dropped.contains(candidate) {
            return RecordOutcome::AlreadyDropped;
        }
        if !host.is_alive(candidate) {
            return RecordOutcome::Stale;
        }

        let kind = host.kind(candidate);
        let name = host.display_name(candidate);
        let Some(bucket) = kind.bucket() else {
            error!(
                candidate = %name,
                kind = %kind,
                "Unexpected candidate type, dropping reference"
            );
            self.dropped.insert(candidate.clone());
            return RecordOutcome::Unrecognized(kind);
        };

        self.recorded.insert(candidate.clone(), bucket);
        self.buckets[bucket.index()].push(ReferenceHit {
            handle: candidate.clone(),
            name,
            kind,
            discovered_at: Utc::now(),
        });
        RecordOutcome::Added(bucket)
    }

    /// Hits of one bucket in discovery order
    pub fn bucket(&self, bucket: ResultBucket) -> &[ReferenceHit<Handle>] {
        &self.buckets[bucket.index()]
    }

    pub fn prefabs(&self) -> &[ReferenceHit<Handle>] {
        self.bucket(ResultBucket::Prefabs)
    }

    pub fn data_assets(&self) -> &[ReferenceHit<Handle>] {
        self.bucket(ResultBucket::DataAssets)
    }

    pub fn scene_references(&self) -> &[ReferenceHit<Handle>] {
        self.bucket(ResultBucket::SceneReferences)
    }

    pub fn contains(&self, candidate: &Handle) -> bool {
        self.recorded.contains_key(candidate)
    }

    pub fn total(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.recorded.clear();
        self.dropped.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;

    #[test]
    fn test_record_sorts_by_kind() {
        let mut host = MemoryHost::new();
        let prefab = host.add_object("Player", ObjectKind::Prefab);
        let data = host.add_object("Stats", ObjectKind::DataAsset);
        let component = host.add_live("Spawner", ObjectKind::SceneComponent);

        let mut agg = ResultAggregator::new();
        assert_eq!(agg.record(&host, &prefab), RecordOutcome::Added(ResultBucket::Prefabs));
        assert_eq!(agg.record(&host, &data), RecordOutcome::Added(ResultBucket::DataAssets));
        assert_eq!(
            agg.record(&host, &component),
            RecordOutcome::Added(ResultBucket::SceneReferences)
        );

        assert_eq!(agg.prefabs()[0].name, "Player");
        assert_eq!(agg.data_assets()[0].handle, data);
        assert_eq!(agg.scene_references()[0].kind, ObjectKind::SceneComponent);
        assert_eq!(agg.total(), 3);
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut host = MemoryHost::new();
        let prefab = host.add_object("Player", ObjectKind::Prefab);

        let mut agg = ResultAggregator::new();
        agg.record(&host, &prefab);
        assert_eq!(
            agg.record(&host, &prefab),
            RecordOutcome::Duplicate(ResultBucket::Prefabs)
        );
        assert_eq!(agg.prefabs().len(), 1);
        assert_eq!(agg.total(), 1);
    }

    #[test]
    fn test_unrecognized_kind_is_dropped() {
        let mut host = MemoryHost::new();
        let material = host.add_object("Wood", ObjectKind::Other("Material".to_string()));

        let mut agg = ResultAggregator::new();
        assert_eq!(
            agg.record(&host, &material),
            RecordOutcome::Unrecognized(ObjectKind::Other("Material".to_string()))
        );
        assert!(agg.is_empty());
        for bucket in ResultBucket::ALL {
            assert!(agg.bucket(bucket).is_empty());
        }
    }

    #[test]
    fn test_unrecognized_kind_is_dropped_once() {
        let mut host = MemoryHost::new();
        let material = host.add_object("Wood", ObjectKind::Other("Material".to_string()));

        let mut agg = ResultAggregator::new();
        assert!(matches!(
            agg.record(&host, &material),
            RecordOutcome::Unrecognized(_)
        ));
        assert_eq!(agg.record(&host, &material), RecordOutcome::AlreadyDropped);
        assert_eq!(agg.record(&host, &material), RecordOutcome::AlreadyDropped);

        agg.clear();
        assert!(matches!(
            agg.record(&host, &material),
            RecordOutcome::Unrecognized(_)
        ));
    }

    #[test]
    fn test_stale_candidate_is_skipped() {
        let mut host = MemoryHost::new();
        let prefab = host.add_object("Player", ObjectKind::Prefab);
        host.destroy(prefab);

        let mut agg = ResultAggregator::new();
        assert_eq!(agg.record(&host, &prefab), RecordOutcome::Stale);
        assert!(agg.is_empty());
    }

    #[test]
    fn test_discovery_order_is_kept() {
        let mut host = MemoryHost::new();
        let ids: Vec<_> = ["c", "a", "b"]
            .iter()
            .map(|n| host.add_object(n, ObjectKind::Prefab))
            .collect();

        let mut agg = ResultAggregator::new();
        for id in &ids {
            agg.record(&host, id);
        }
        let names: Vec<&str> = agg.prefabs().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        agg.clear();
        assert!(agg.prefabs().is_empty());
        assert!(!agg.contains(&ids[0]));
    }
}
