//! Text-serialized object documents
//!
//! Asset and scene files are YAML streams where each object starts with a
//! header line `--- !u!<classId> &<fileId>` followed by its type name:
//!
//! ```text
//! --- !u!114 &11400000
//! MonoBehaviour:
//!   m_Name: Sword
//!   m_Script: {fileID: 11500000, guid: 3f1c0a2b4d5e6f708192a3b4c5d6e7f8, type: 3}
//!   icon: {fileID: 21300000, guid: 0a1b2c3d4e5f60718293a4b5c6d7e8f9, type: 3}
//!   owner: {fileID: 0}
//! ```
//!
//! Only what reference scanning needs is extracted: type, name, owning game
//! object, and every object reference literal in file order. Nothing else of
//! the YAML is interpreted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--- !u!(\d+) &(-?\d+)").expect("valid header regex"));
static TYPE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*):\s*$").expect("valid type regex"));
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{fileID: (-?\d+)(?:, guid: ([0-9a-fA-F]{32}))?(?:, type: \d+)?\}")
        .expect("valid reference regex")
});
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^  m_Name: (.*)$").expect("valid name regex"));
static GAME_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^  m_GameObject: \{fileID: (-?\d+)\}").expect("valid owner regex")
});

/// Magic prefix of text-serialized files
const YAML_MAGIC: &[u8] = b"%YAML";

/// An object reference literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRef {
    pub file_id: i64,
    /// Set for references into another file
    pub guid: Option<String>,
}

impl RawRef {
    /// `{fileID: 0}` is the serialized null reference
    pub fn is_null(&self) -> bool {
        self.file_id == 0 && self.guid.is_none()
    }
}

/// One object of a YAML stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub class_id: u32,
    pub file_id: i64,
    pub type_name: String,
    pub name: Option<String>,
    pub game_object: Option<i64>,
    pub references: Vec<RawRef>,
}

/// Split a YAML stream into documents
pub fn parse_documents(text: &str) -> Vec<Document> {
    let mut docs: Vec<Document> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = HEADER.captures(line) {
            let (Ok(class_id), Ok(file_id)) = (caps[1].parse(), caps[2].parse()) else {
                continue;
            };
            docs.push(Document {
                class_id,
                file_id,
                type_name: String::new(),
                name: None,
                game_object: None,
                references: Vec::new(),
            });
            continue;
        }

        let Some(doc) = docs.last_mut() else {
            continue;
        };

        if doc.type_name.is_empty() {
            if let Some(caps) = TYPE_LINE.captures(line) {
                doc.type_name = caps[1].to_string();
            }
            continue;
        }

        if doc.name.is_none() {
            if let Some(caps) = NAME.captures(line) {
                doc.name = Some(caps[1].trim().to_string());
            }
        }
        if doc.game_object.is_none() {
            if let Some(caps) = GAME_OBJECT.captures(line) {
                doc.game_object = caps[1].parse().ok();
            }
        }

        for caps in REFERENCE.captures_iter(line) {
            let Ok(file_id) = caps[1].parse() else {
                continue;
            };
            let reference = RawRef {
                file_id,
                guid: caps.get(2).map(|g| g.as_str().to_ascii_lowercase()),
            };
            if !reference.is_null() {
                doc.references.push(reference);
            }
        }
    }

    docs
}

/// Read and parse a file if it is text-serialized.
///
/// Binary files and files that cannot be read yield `None`.
pub fn read_documents(path: &Path) -> Option<Vec<Document>> {
    let mut file = std::fs::File::open(path).ok()?;
    let mut magic = [0u8; 5];
    file.read_exact(&mut magic).ok()?;
    if magic != YAML_MAGIC {
        return None;
    }
    let mut rest = String::new();
    file.read_to_string(&mut rest).ok()?;
    Some(parse_documents(&rest))
}
