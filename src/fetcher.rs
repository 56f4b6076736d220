//! Recursive download of a repository path.
//!
//! A [`FetchSession`] lists its root path once. A file root is downloaded
//! on its own; a directory root is walked with every sibling at every level
//! fetched concurrently, and the downloaded files are collected into one
//! flat, unordered list.
//!
//! The session result is computed at most once. Every call to
//! [`FetchSession::start`], including concurrent ones, shares it.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tokio::sync::{Mutex, OnceCell, Semaphore, SemaphorePermit};

use crate::{
    error::Result,
    source::ContentSource,
    types::{ContentNode, Contents, FetchOutcome, FetchedFile, FileNode, RepositoryCoordinates},
};

/// One root-level fetch of a repository path
pub struct FetchSession {
    source: Arc<dyn ContentSource>,
    owner: String,
    repository: String,
    base_path: Option<String>,
    reference: Option<String>,
    /// Caps in-flight remote calls when set
    limiter: Option<Semaphore>,
    files: Mutex<Vec<FetchedFile>>,
    result: OnceCell<Result<FetchOutcome>>,
}

impl FetchSession {
    pub fn new(
        source: Arc<dyn ContentSource>,
        owner: impl Into<String>,
        repository: impl Into<String>,
        base_path: Option<String>,
        reference: Option<String>,
    ) -> Self {
        Self {
            source,
            owner: owner.into(),
            repository: repository.into(),
            base_path,
            reference,
            limiter: None,
            files: Mutex::new(Vec::new()),
            result: OnceCell::new(),
        }
    }

    pub fn for_coordinates(
        source: Arc<dyn ContentSource>,
        coordinates: &RepositoryCoordinates,
    ) -> Self {
        Self::new(
            source,
            coordinates.owner.clone(),
            coordinates.repository.clone(),
            coordinates.path.clone(),
            coordinates.ref_name().map(String::from),
        )
    }

    /// Limit the number of listings and downloads in flight at once
    ///
    /// `0` means unlimited.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.limiter = (limit > 0).then(|| Semaphore::new(limit));
        self
    }

    /// Fetch everything under the session's root path
    ///
    /// Resolves only once the whole tree has been downloaded. If any listing
    /// or download fails, the session fails. Later calls return a clone of
    /// the first result without contacting the source again.
    pub async fn start(&self) -> Result<FetchOutcome> {
        self.result.get_or_init(|| self.run()).await.clone()
    }

    async fn run(&self) -> Result<FetchOutcome> {
        tracing::debug!(
            source = %self.source.identifier(),
            owner = %self.owner,
            repository = %self.repository,
            path = ?self.base_path,
            reference = ?self.reference,
            "Starting fetch session"
        );

        let outcome = match self.list(self.base_path.as_deref()).await? {
            Contents::File(file) => FetchOutcome::File(self.download(&file).await?),
            Contents::Listing(nodes) => {
                self.fetch_nodes(nodes).await?;
                FetchOutcome::Directory(std::mem::take(&mut *self.files.lock().await))
            }
        };

        tracing::info!(
            owner = %self.owner,
            repository = %self.repository,
            files = outcome.files().len(),
            bytes = outcome.total_bytes(),
            "Fetch session completed"
        );

        Ok(outcome)
    }

    /// Fetch all siblings concurrently
    fn fetch_nodes(&self, nodes: Vec<ContentNode>) -> BoxFuture<'_, Result<()>> {
        async move {
            try_join_all(nodes.into_iter().map(|node| self.fetch_node(node))).await?;
            Ok(())
        }
        .boxed()
    }

    async fn fetch_node(&self, node: ContentNode) -> Result<()> {
        match node {
            ContentNode::File(file) => {
                let fetched = self.download(&file).await?;
                self.files.lock().await.push(fetched);
            }
            ContentNode::Directory(dir) => match self.list(Some(&dir.path)).await? {
                Contents::Listing(nodes) => self.fetch_nodes(nodes).await?,
                // The entry changed type between listings
                Contents::File(file) => {
                    let fetched = self.download(&file).await?;
                    self.files.lock().await.push(fetched);
                }
            },
        }
        Ok(())
    }

    async fn list(&self, path: Option<&str>) -> Result<Contents> {
        let _permit = self.permit().await;
        self.source
            .list_content(&self.owner, &self.repository, path, self.reference.as_deref())
            .await
    }

    async fn download(&self, file: &FileNode) -> Result<FetchedFile> {
        let _permit = self.permit().await;
        let content = self.source.download(file).await?;

        Ok(FetchedFile {
            name: file.name.clone(),
            path: file.path.clone(),
            content,
        })
    }

    async fn permit(&self) -> Option<SemaphorePermit<'_>> {
        match &self.limiter {
            // The semaphore is never closed
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        }
    }
}

/// Fetch a repository path in a fresh, unlimited session
pub async fn fetch_all(
    source: Arc<dyn ContentSource>,
    owner: &str,
    repository: &str,
    path: Option<&str>,
    reference: Option<&str>,
) -> Result<FetchOutcome> {
    FetchSession::new(
        source,
        owner,
        repository,
        path.map(String::from),
        reference.map(String::from),
    )
    .start()
    .await
}
