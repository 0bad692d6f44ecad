use serde::{Deserialize, Serialize};

/// Repository information carried by the triggering event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    pub full_name: String,
    pub clone_url: String,
    pub default_branch: String,
}

/// Pipeline state carried by the triggering event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineInfo {
    pub branch: String,
    pub commit: String,
    #[serde(rename = "ref")]
    pub ref_field: String,
}

/// Snapshot of the event a configuration request was made for.
///
/// Deserialized straight from the orchestrator's request body. Keys the
/// service does not use (`netrc`, `configs`, ...) are ignored and missing
/// fields default to empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventContext {
    pub repo: Repository,
    pub pipeline: PipelineInfo,
}

/// Where the override files live on the backend, after template rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coordinates {
    pub namespace: String,
    pub repository: String,
    pub branch: String,
    pub path: String,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}@{}:{}",
            self.namespace, self.repository, self.branch, self.path
        )
    }
}

/// Kind of a directory entry, normalized across backends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Submodule,
    Other,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Submodule => "submodule",
            EntryKind::Other => "other",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a backend directory listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

pub const YAML_EXTENSIONS: [&str; 2] = [".yml", ".yaml"];

impl DirEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    /// Regular file whose name ends exactly in `.yml` or `.yaml`
    pub fn is_yaml_file(&self) -> bool {
        self.kind == EntryKind::File
            && YAML_EXTENSIONS.iter().any(|ext| self.name.ends_with(ext))
    }
}

/// A fetched and decoded YAML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub content: String,
}

impl FileRecord {
    pub fn new(entry: &DirEntry, content: String) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            kind: EntryKind::File,
            content,
        }
    }
}
