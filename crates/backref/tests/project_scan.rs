//! End-to-end tests: scan a small project written to a temp directory

use backref::{run_scan, start_session, ProjectError, ScanReport, ScanRequest};
use backref_scan::{CancelToken, ResultBucket, ScanConfig, TickOutcome};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SWORD: &str = "a0000000000000000000000000000001";
const SHIELD: &str = "a0000000000000000000000000000002";
const PLAYER: &str = "b0000000000000000000000000000001";
const ARMORY: &str = "b0000000000000000000000000000002";
const LOOT: &str = "c0000000000000000000000000000001";
const BLADE: &str = "c0000000000000000000000000000002";
const SCENE: &str = "d0000000000000000000000000000001";
const SCRIPT: &str = "e0000000000000000000000000000001";

struct TestEnv {
    _temp: TempDir,
    root: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("Assets");
        std::fs::create_dir_all(&root).expect("Failed to create project root");
        Self { _temp: temp, root }
    }

    fn create_file(&self, rel: &str, guid: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        std::fs::write(
            self.root.join(format!("{rel}.meta")),
            format!("fileFormatVersion: 2\nguid: {guid}\n"),
        )
        .expect("Failed to write meta");
        path
    }

    fn create_yaml(&self, rel: &str, guid: &str, body: &str) -> PathBuf {
        let content = format!("%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n{body}");
        self.create_file(rel, guid, content.as_bytes())
    }

    /// Sword is referenced by Player (direct), Armory (through Player), Loot,
    /// a material asset, and one scene component
    fn sample_project() -> Self {
        let env = Self::new();
        env.create_yaml(
            "Items/Sword.asset",
            SWORD,
            "--- !u!114 &11400000\nMonoBehaviour:\n  m_Name: Sword\n",
        );
        env.create_yaml(
            "Items/Shield.asset",
            SHIELD,
            "--- !u!114 &11400000\nMonoBehaviour:\n  m_Name: Shield\n",
        );
        env.create_yaml(
            "Prefabs/Player.prefab",
            PLAYER,
            &format!(
                "--- !u!1 &100\nGameObject:\n  m_Name: Player\n--- !u!114 &200\nMonoBehaviour:\n  m_GameObject: {{fileID: 100}}\n  weapon: {{fileID: 11400000, guid: {SWORD}, type: 2}}\n"
            ),
        );
        env.create_yaml(
            "Prefabs/Armory.prefab",
            ARMORY,
            &format!(
                "--- !u!1 &100\nGameObject:\n  m_Name: Armory\n--- !u!114 &200\nMonoBehaviour:\n  m_GameObject: {{fileID: 100}}\n  guard: {{fileID: 100, guid: {PLAYER}, type: 3}}\n"
            ),
        );
        env.create_yaml(
            "Data/Loot.asset",
            LOOT,
            &format!(
                "--- !u!114 &11400000\nMonoBehaviour:\n  m_Name: Loot Table\n  drops:\n  - {{fileID: 11400000, guid: {SWORD}, type: 2}}\n  - {{fileID: 11400000, guid: {SHIELD}, type: 2}}\n"
            ),
        );
        env.create_yaml(
            "Data/Blade.asset",
            BLADE,
            &format!(
                "--- !u!21 &2100000\nMaterial:\n  m_Name: Blade\n  source: {{fileID: 11400000, guid: {SWORD}, type: 2}}\n"
            ),
        );
        env.create_file("Data/Baked.asset", "f0000000000000000000000000000001", &[0, 1, 2, 3, 4, 5, 6]);
        env.create_yaml(
            "Scenes/Main.unity",
            SCENE,
            &format!(
                "--- !u!1 &500\nGameObject:\n  m_Name: Spawner\n--- !u!114 &502\nMonoBehaviour:\n  m_GameObject: {{fileID: 500}}\n  item: {{fileID: 11400000, guid: {SWORD}, type: 2}}\n  next: {{fileID: 503}}\n--- !u!1 &600\nGameObject:\n  m_Name: Door\n--- !u!114 &503\nMonoBehaviour:\n  m_GameObject: {{fileID: 600}}\n  m_Script: {{fileID: 11500000, guid: {SCRIPT}, type: 3}}\n"
            ),
        );
        env
    }

    fn request(&self, targets: &[&str], frame_budget_ms: u64) -> ScanRequest {
        ScanRequest {
            config: ScanConfig {
                root_dir: self.root.clone(),
                frame_budget_ms,
                tick_interval_ms: 0,
                ..Default::default()
            },
            scenes: vec![self.root.join("Scenes/Main.unity")],
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn group_names(report: &ScanReport, bucket: ResultBucket) -> Vec<String> {
    report
        .groups
        .iter()
        .find(|g| g.bucket == bucket)
        .map(|g| g.entries.iter().map(|e| e.name.clone()).collect())
        .unwrap_or_default()
}

fn scan(env: &TestEnv, targets: &[&str], frame_budget_ms: u64) -> ScanReport {
    run_scan(
        &env.request(targets, frame_budget_ms),
        &CancelToken::new(),
        None,
    )
    .expect("scan failed")
}

// ============================================================================
// Full scans
// ============================================================================

#[test]
fn test_scan_finds_all_reference_kinds() {
    let env = TestEnv::sample_project();
    let report = scan(&env, &["Items/Sword.asset"], 50);

    assert!(!report.cancelled);
    // Newest first: Armory is walked before Player
    assert_eq!(
        group_names(&report, ResultBucket::Prefabs),
        vec!["Player", "Armory"]
    );
    assert_eq!(
        group_names(&report, ResultBucket::DataAssets),
        vec!["Loot Table"]
    );
    assert_eq!(
        group_names(&report, ResultBucket::SceneReferences),
        vec!["Spawner"]
    );

    let stats = report.stats.as_ref().expect("stats");
    assert_eq!(stats.unrecognized, 1);
    assert_eq!(stats.candidates_skipped, 1);
    assert_eq!(stats.live_total, 2);
    assert!(report.failures.is_empty());
}

#[test]
fn test_report_locations() {
    let env = TestEnv::sample_project();
    let report = scan(&env, &["Items/Sword.asset"], 50);

    assert_eq!(report.targets.len(), 1);
    assert_eq!(report.targets[0].name, "Sword");
    assert_eq!(report.targets[0].location, "Items/Sword.asset");

    let scene = &report.groups[ResultBucket::ALL
        .iter()
        .position(|b| *b == ResultBucket::SceneReferences)
        .unwrap()];
    assert_eq!(scene.entries[0].location, "Scenes/Main.unity#502");
    assert_eq!(scene.entries[0].kind, "SceneComponent");
}

#[test]
fn test_scene_object_target() {
    let env = TestEnv::sample_project();
    let report = scan(&env, &["Scenes/Main.unity#503"], 50);

    assert!(group_names(&report, ResultBucket::Prefabs).is_empty());
    assert!(group_names(&report, ResultBucket::DataAssets).is_empty());
    assert_eq!(
        group_names(&report, ResultBucket::SceneReferences),
        vec!["Spawner"]
    );
}

#[test]
fn test_two_targets_record_each_candidate_once() {
    let env = TestEnv::sample_project();
    let report = scan(&env, &["Items/Sword.asset", "Items/Shield.asset"], 50);

    // Loot references both
    assert_eq!(
        group_names(&report, ResultBucket::DataAssets),
        vec!["Loot Table"]
    );
    assert_eq!(report.total(), 4);
}

#[test]
fn test_budget_does_not_change_results() {
    let env = TestEnv::sample_project();
    let sliced = scan(&env, &["Items/Sword.asset"], 0);
    let whole = scan(&env, &["Items/Sword.asset"], 60_000);

    for bucket in ResultBucket::ALL {
        assert_eq!(group_names(&sliced, bucket), group_names(&whole, bucket));
    }
    assert!(sliced.stats.unwrap().advances > whole.stats.unwrap().advances);
}

#[test]
fn test_json_report() {
    let env = TestEnv::sample_project();
    let report = scan(&env, &["Items/Sword.asset"], 50);

    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(value["cancelled"], false);
    assert_eq!(value["groups"].as_array().unwrap().len(), 3);
    assert_eq!(value["groups"][0]["bucket"], "prefabs");
    assert_eq!(value["groups"][0]["title"], "Prefab References");
}

// ============================================================================
// Cancellation and errors
// ============================================================================

#[test]
fn test_cancel_before_first_tick() {
    let env = TestEnv::sample_project();
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = run_scan(&env.request(&["Items/Sword.asset"], 0), &cancel, None).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.total(), 0);
}

#[test]
fn test_closing_scene_mid_scan_skips_its_components() {
    let env = TestEnv::sample_project();
    let mut session = start_session(&env.request(&["Items/Sword.asset"], 0)).unwrap();

    session.host_mut().close_scene(0);
    while session.tick() == TickOutcome::Continuing {}

    assert!(session.scene_references().is_empty());
    assert_eq!(session.prefabs().len(), 2);
}

#[test]
fn test_unknown_target() {
    let env = TestEnv::sample_project();
    let err = run_scan(
        &env.request(&["Items/Axe.asset"], 50),
        &CancelToken::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ProjectError::UnknownAsset(_)));
}

#[test]
fn test_missing_root() {
    let env = TestEnv::new();
    let mut request = env.request(&["Items/Sword.asset"], 50);
    request.config.root_dir = env.root.join("Nope");
    request.scenes.clear();

    let err = start_session(&request).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Scan(backref_scan::BackrefError::RootNotFound(_))
    ));
}

#[test]
fn test_binary_scene_is_rejected() {
    let env = TestEnv::sample_project();
    env.create_file("Scenes/Baked.unity", "f0000000000000000000000000000002", b"\x00\x01binary");
    let mut request = env.request(&["Items/Sword.asset"], 50);
    request.scenes = vec![env.root.join("Scenes/Baked.unity")];

    let err = start_session(&request).unwrap_err();
    assert!(matches!(err, ProjectError::NotTextSerialized(p) if p.ends_with(Path::new("Baked.unity"))));
}
