use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::Result,
    types::{Contents, FileNode},
};

/// Core abstraction over a repository content API
///
/// Implementors give read-only access to the listing of a path and to the
/// raw bytes of the files it names. Each call is exactly one remote request;
/// retries are left to the caller.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// List the content at `path` (repository root when `None`)
    ///
    /// Returns `Contents::File` when the path names a file, and
    /// `ContentError::NotFound` if it doesn't exist
    async fn list_content(
        &self,
        owner: &str,
        repository: &str,
        path: Option<&str>,
        reference: Option<&str>,
    ) -> Result<Contents>;

    /// Download the raw bytes of a file returned by `list_content`
    async fn download(&self, file: &FileNode) -> Result<Bytes>;

    /// Get a human-readable identifier for this source (for logging/debugging)
    fn identifier(&self) -> String;
}
