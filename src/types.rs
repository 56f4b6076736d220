use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Which kind of page a repository URL pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// `/blob/` URLs, usually a single file
    Blob,
    /// `/tree/` URLs, usually a directory
    Tree,
}

impl ResourceKind {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "blob" => Some(ResourceKind::Blob),
            "tree" => Some(ResourceKind::Tree),
            _ => None,
        }
    }
}

/// A ref together with the kind segment that preceded it in the URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSpec {
    pub kind: ResourceKind,
    pub name: String,
}

/// Addressable location of a resource inside a repository
///
/// The ref and the kind only ever appear together, so they share one
/// optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCoordinates {
    pub owner: String,
    pub repository: String,
    pub reference: Option<RefSpec>,
    pub path: Option<String>,
}

impl RepositoryCoordinates {
    pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            reference: None,
            path: None,
        }
    }

    pub fn with_ref(mut self, kind: ResourceKind, name: impl Into<String>) -> Self {
        self.reference = Some(RefSpec {
            kind,
            name: name.into(),
        });
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Branch, tag or commit name, if the URL named one
    pub fn ref_name(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.name.as_str())
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        self.reference.as_ref().map(|r| r.kind)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// A file entry returned by the content listing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub sha: String,
    /// Location the raw bytes can be downloaded from
    pub download_url: Option<String>,
}

/// A directory entry returned by the content listing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub sha: String,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    File(FileNode),
    Directory(DirectoryNode),
}

impl ContentNode {
    pub fn name(&self) -> &str {
        match self {
            ContentNode::File(file) => &file.name,
            ContentNode::Directory(dir) => &dir.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ContentNode::File(file) => &file.path,
            ContentNode::Directory(dir) => &dir.path,
        }
    }
}

/// Result of listing a single path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// The path named a file
    File(FileNode),
    /// The path named a directory
    Listing(Vec<ContentNode>),
}

/// A downloaded file and where it lives in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub name: String,
    pub path: String,
    pub content: Bytes,
}

/// Everything a fetch session produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The root path was a file
    File(FetchedFile),
    /// The root path was a directory; order is unspecified
    Directory(Vec<FetchedFile>),
}

impl FetchOutcome {
    pub fn is_directory(&self) -> bool {
        matches!(self, FetchOutcome::Directory(_))
    }

    pub fn files(&self) -> &[FetchedFile] {
        match self {
            FetchOutcome::File(file) => std::slice::from_ref(file),
            FetchOutcome::Directory(files) => files,
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.files().iter().map(|f| f.content.len()).sum()
    }
}
