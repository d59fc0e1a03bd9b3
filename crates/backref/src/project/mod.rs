//! Host over a text-serialized game project
//!
//! Assets are identified by the guid of their `.meta` sidecar. Scene
//! components are identified by the scene they were opened from and their
//! local file id. Asset contents are parsed on first use and cached for the
//! lifetime of the host.

pub mod index;
pub mod yaml;

use crate::error::{ProjectError, Result};
use backref_scan::{BackrefError, CorpusProvider, DependencyIntrospector, ObjectKind, ObjectModel};
use index::GuidIndex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};
use yaml::{Document, RawRef};

const GAME_OBJECT: &str = "GameObject";
const MONO_BEHAVIOUR: &str = "MonoBehaviour";
const PREFAB_EXTENSION: &str = "prefab";
const SCENE_EXTENSION: &str = "unity";

/// Handle to an object of a [`ProjectHost`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectRef {
    /// Main object of an asset file
    Asset { guid: String },
    /// Object inside an open scene
    Component { scene: usize, file_id: i64 },
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Asset { guid } => write!(f, "guid:{}", guid),
            ObjectRef::Component { scene, file_id } => write!(f, "scene{}&{}", scene, file_id),
        }
    }
}

/// Parsed contents of an asset file
#[derive(Debug)]
struct AssetData {
    kind: ObjectKind,
    name: String,
    /// Guids referenced anywhere in the file, in file order
    guid_refs: Vec<String>,
}

impl AssetData {
    fn from_documents(path: &Path, docs: &[Document]) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let has_extension = |expected: &str| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
        };

        let main = docs.first();
        let kind = match main.map(|d| d.type_name.as_str()) {
            _ if has_extension(PREFAB_EXTENSION) => ObjectKind::Prefab,
            _ if has_extension(SCENE_EXTENSION) => ObjectKind::Other("SceneAsset".to_string()),
            Some(GAME_OBJECT) => ObjectKind::Prefab,
            Some(MONO_BEHAVIOUR) => ObjectKind::DataAsset,
            Some(other) => ObjectKind::Other(other.to_string()),
            None => ObjectKind::Other("Empty".to_string()),
        };
        let name = match &kind {
            ObjectKind::Prefab => stem,
            _ => main
                .and_then(|d| d.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or(stem),
        };

        let guid_refs = docs
            .iter()
            .flat_map(|d| d.references.iter())
            .filter_map(|r| r.guid.clone())
            .collect();

        Self {
            kind,
            name,
            guid_refs,
        }
    }
}

/// An opened scene
#[derive(Debug)]
struct SceneData {
    path: PathBuf,
    docs: Vec<Document>,
    by_file_id: HashMap<i64, usize>,
}

impl SceneData {
    fn new(path: PathBuf, docs: Vec<Document>) -> Self {
        let by_file_id = docs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.file_id, i))
            .collect();
        Self {
            path,
            docs,
            by_file_id,
        }
    }

    fn document(&self, file_id: i64) -> Option<&Document> {
        self.by_file_id.get(&file_id).map(|&i| &self.docs[i])
    }

    fn component_name(&self, doc: &Document) -> String {
        doc.game_object
            .and_then(|go| self.document(go))
            .and_then(|go| go.name.clone())
            .or_else(|| doc.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} &{}", doc.type_name, doc.file_id))
    }
}

/// Project loaded from disk
#[derive(Debug)]
pub struct ProjectHost {
    root: PathBuf,
    index: GuidIndex,
    /// Slot per opened scene; `None` once closed so indices stay stable
    scenes: Vec<Option<SceneData>>,
    assets: RefCell<HashMap<String, Option<Rc<AssetData>>>>,
}

impl ProjectHost {
    /// Index the project under `root`.
    ///
    /// The root is canonicalized so index keys, scene paths and resolved
    /// targets share one absolute form.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BackrefError::RootNotFound(root).into());
        }
        let root = std::fs::canonicalize(&root).map_err(BackrefError::from)?;
        let index = GuidIndex::build(&root);
        info!(root = %root.display(), assets = index.len(), "Project indexed");
        Ok(Self {
            root,
            index,
            scenes: Vec::new(),
            assets: RefCell::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &GuidIndex {
        &self.index
    }

    /// Open a scene so its components become live instances.
    ///
    /// Opening the same path twice returns the existing slot.
    pub fn open_scene(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = self.locate(path.as_ref());
        if let Some(slot) = self.scene_slot(&path) {
            return Ok(slot);
        }
        if !path.is_file() {
            return Err(BackrefError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("scene not found: {}", path.display()),
            ))
            .into());
        }
        let docs =
            yaml::read_documents(&path).ok_or_else(|| ProjectError::NotTextSerialized(path.clone()))?;
        debug!(scene = %path.display(), documents = docs.len(), "Scene opened");
        self.scenes.push(Some(SceneData::new(path, docs)));
        Ok(self.scenes.len() - 1)
    }

    /// Close a scene. Its components become stale handles.
    pub fn close_scene(&mut self, slot: usize) -> bool {
        match self.scenes.get_mut(slot).and_then(Option::take) {
            Some(closed) => {
                debug!(scene = %closed.path.display(), "Scene closed");
                true
            }
            None => false,
        }
    }

    /// Turn a command-line target into a handle.
    ///
    /// `PATH` names an asset by its file; `SCENE#FILE_ID` names an object in
    /// an open scene.
    pub fn resolve_target(&self, target: &str) -> Result<ObjectRef> {
        if let Some((scene, file_id)) = target.rsplit_once('#') {
            let file_id: i64 = file_id
                .trim_start_matches('&')
                .parse()
                .map_err(|_| ProjectError::InvalidTarget(target.to_string()))?;
            let scene_path = self.locate(Path::new(scene));
            let slot = self
                .scene_slot(&scene_path)
                .ok_or_else(|| ProjectError::SceneNotOpen(scene_path.clone()))?;
            let handle = ObjectRef::Component {
                scene: slot,
                file_id,
            };
            if !self.is_alive(&handle) {
                return Err(ProjectError::UnknownObject {
                    scene: scene_path,
                    file_id,
                });
            }
            return Ok(handle);
        }

        let path = self.locate(Path::new(target));
        self.index
            .guid_of(&path)
            .map(|guid| ObjectRef::Asset {
                guid: guid.to_string(),
            })
            .ok_or(ProjectError::UnknownAsset(path))
    }

    /// File an object lives in
    pub fn path_of(&self, handle: &ObjectRef) -> Option<&Path> {
        match handle {
            ObjectRef::Asset { guid } => self.index.path_of(guid),
            ObjectRef::Component { scene, .. } => self.scene(*scene).map(|s| s.path.as_path()),
        }
    }

    /// Human-readable location: the asset path relative to the root, or
    /// `scene#fileId` for scene objects
    pub fn location(&self, handle: &ObjectRef) -> String {
        let Some(path) = self.path_of(handle) else {
            return "<missing>".to_string();
        };
        let shown = path.strip_prefix(&self.root).unwrap_or(path).display().to_string();
        match handle {
            ObjectRef::Asset { .. } => shown,
            ObjectRef::Component { file_id, .. } => format!("{}#{}", shown, file_id),
        }
    }

    /// Absolute, canonical form of a user or walk path.
    ///
    /// Relative paths are tried against the working directory first, then
    /// against the project root. Paths that do not exist come back unchanged.
    fn locate(&self, path: &Path) -> PathBuf {
        let candidate = if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        std::fs::canonicalize(&candidate).unwrap_or_else(|_| path.to_path_buf())
    }

    fn scene(&self, slot: usize) -> Option<&SceneData> {
        self.scenes.get(slot).and_then(|s| s.as_ref())
    }

    fn scene_slot(&self, path: &Path) -> Option<usize> {
        self.scenes
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.path.as_path() == path))
    }

    fn scene_document(&self, slot: usize, file_id: i64) -> Option<(&SceneData, &Document)> {
        let scene = self.scene(slot)?;
        scene.document(file_id).map(|doc| (scene, doc))
    }

    /// Parse an asset on first use
    fn asset(&self, guid: &str) -> Option<Rc<AssetData>> {
        if let Some(cached) = self.assets.borrow().get(guid) {
            return cached.clone();
        }
        let data = self.index.path_of(guid).and_then(|path| {
            match yaml::read_documents(path) {
                Some(docs) => Some(Rc::new(AssetData::from_documents(path, &docs))),
                None => {
                    debug!(path = %path.display(), "Asset is not text-serialized");
                    None
                }
            }
        });
        self.assets.borrow_mut().insert(guid.to_string(), data.clone());
        data
    }

    fn guid_handle(&self, raw: &RawRef) -> Option<ObjectRef> {
        raw.guid.as_ref().map(|guid| ObjectRef::Asset { guid: guid.clone() })
    }
}

impl ObjectModel for ProjectHost {
    type Handle = ObjectRef;

    fn is_alive(&self, handle: &ObjectRef) -> bool {
        match handle {
            ObjectRef::Asset { guid } => self.index.path_of(guid).is_some_and(|p| p.is_file()),
            ObjectRef::Component { scene, file_id } => {
                self.scene_document(*scene, *file_id).is_some()
            }
        }
    }

    fn kind(&self, handle: &ObjectRef) -> ObjectKind {
        match handle {
            ObjectRef::Asset { guid } => match self.asset(guid) {
                Some(data) => data.kind.clone(),
                None => ObjectKind::Other("Binary".to_string()),
            },
            ObjectRef::Component { scene, file_id } => {
                match self.scene_document(*scene, *file_id) {
                    Some((_, doc)) if doc.type_name == MONO_BEHAVIOUR => ObjectKind::SceneComponent,
                    Some((_, doc)) => ObjectKind::Other(doc.type_name.clone()),
                    None => ObjectKind::Other("Missing".to_string()),
                }
            }
        }
    }

    fn display_name(&self, handle: &ObjectRef) -> String {
        match handle {
            ObjectRef::Asset { guid } => match self.asset(guid) {
                Some(data) => data.name.clone(),
                None => self
                    .index
                    .path_of(guid)
                    .and_then(|p| p.file_stem())
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| guid.clone()),
            },
            ObjectRef::Component { scene, file_id } => {
                match self.scene_document(*scene, *file_id) {
                    Some((scene, doc)) => scene.component_name(doc),
                    None => "<missing>".to_string(),
                }
            }
        }
    }
}

impl CorpusProvider for ProjectHost {
    fn load_asset(&self, path: &Path) -> Option<ObjectRef> {
        let guid = match self.index.guid_of(&self.locate(path)) {
            Some(guid) => guid.to_string(),
            None => {
                debug!(path = %path.display(), "No .meta guid, skipping");
                return None;
            }
        };
        self.asset(&guid)?;
        Some(ObjectRef::Asset { guid })
    }

    fn live_instances(&self) -> Vec<ObjectRef> {
        self.scenes
            .iter()
            .enumerate()
            .filter_map(|(slot, scene)| scene.as_ref().map(|s| (slot, s)))
            .flat_map(|(slot, scene)| {
                scene
                    .docs
                    .iter()
                    .filter(|d| d.type_name == MONO_BEHAVIOUR)
                    .map(move |d| ObjectRef::Component {
                        scene: slot,
                        file_id: d.file_id,
                    })
            })
            .collect()
    }
}

impl DependencyIntrospector for ProjectHost {
    fn collect_dependencies(&self, root: &ObjectRef) -> Vec<ObjectRef> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        match root {
            ObjectRef::Asset { guid } => {
                seen.insert(guid.clone());
                queue.push_back(guid.clone());
            }
            ObjectRef::Component { scene, file_id } => {
                if let Some((_, doc)) = self.scene_document(*scene, *file_id) {
                    queue.extend(doc.references.iter().filter_map(|r| r.guid.clone()));
                }
            }
        }

        let mut dependencies = vec![root.clone()];
        if let ObjectRef::Component { .. } = root {
            for guid in queue.iter() {
                if seen.insert(guid.clone()) && self.index.path_of(guid).is_some() {
                    dependencies.push(ObjectRef::Asset { guid: guid.clone() });
                }
            }
        }

        while let Some(guid) = queue.pop_front() {
            let Some(data) = self.asset(&guid) else {
                continue;
            };
            for dep in &data.guid_refs {
                // Built-in resources and deleted assets have no .meta here
                if self.index.path_of(dep).is_none() || !seen.insert(dep.clone()) {
                    continue;
                }
                dependencies.push(ObjectRef::Asset { guid: dep.clone() });
                queue.push_back(dep.clone());
            }
        }

        dependencies
    }

    fn for_each_reference_field(
        &self,
        candidate: &ObjectRef,
        visitor: &mut dyn FnMut(&ObjectRef) -> ControlFlow<()>,
    ) {
        match candidate {
            ObjectRef::Asset { guid } => {
                let Some(data) = self.asset(guid) else {
                    return;
                };
                for dep in &data.guid_refs {
                    let value = ObjectRef::Asset { guid: dep.clone() };
                    if visitor(&value).is_break() {
                        return;
                    }
                }
            }
            ObjectRef::Component { scene, file_id } => {
                let Some((_, doc)) = self.scene_document(*scene, *file_id) else {
                    warn!(handle = %candidate, "Field walk on a closed scene object");
                    return;
                };
                for raw in &doc.references {
                    let value = self.guid_handle(raw).unwrap_or(ObjectRef::Component {
                        scene: *scene,
                        file_id: raw.file_id,
                    });
                    if visitor(&value).is_break() {
                        return;
                    }
                }
            }
        }
    }
}
