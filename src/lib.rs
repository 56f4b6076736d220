pub mod archive;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filename;
pub mod github;
pub mod resource_url;
pub mod server;
pub mod source;
pub mod types;

pub use archive::{archive_stream, write_archive, ArchiveEntry};
pub use config::Config;
pub use error::{ContentError, Result};
pub use fetcher::{fetch_all, FetchSession};
pub use filename::derive_filename;
pub use github::{GitHubConfig, GitHubSource};
pub use resource_url::resolve;
pub use server::{router, ApiError, AppState};
pub use source::ContentSource;
pub use types::{
    ContentNode, Contents, DirectoryNode, FetchOutcome, FetchedFile, FileNode, RefSpec,
    RepositoryCoordinates, ResourceKind,
};
