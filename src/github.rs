use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{
    error::{ContentError, Result},
    source::ContentSource,
    types::{ContentNode, Contents, DirectoryNode, FileNode},
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Settings for [`GitHubSource`]
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Root of the REST API, without a trailing `/repos`
    pub api_base_url: String,
    /// Token sent with every request, if any
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            user_agent: concat!("gitlink/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// GitHub-backed content source
///
/// Lists content through the REST "contents" endpoint and downloads file
/// bytes from the `download_url` each listing entry carries.
#[derive(Clone)]
pub struct GitHubSource {
    client: Client,
    api_base_url: Url,
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiContents {
    Listing(Vec<ApiNode>),
    Single(ApiNode),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ApiNode {
    File(ApiEntry),
    Dir(ApiEntry),
    /// Symlinks and submodules
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize)]
struct ApiEntry {
    name: String,
    path: String,
    #[serde(default)]
    size: u64,
    sha: String,
    #[serde(default)]
    download_url: Option<String>,
}

impl From<ApiEntry> for FileNode {
    fn from(entry: ApiEntry) -> Self {
        FileNode {
            name: entry.name,
            path: entry.path,
            size: entry.size,
            sha: entry.sha,
            download_url: entry.download_url,
        }
    }
}

impl From<ApiEntry> for DirectoryNode {
    fn from(entry: ApiEntry) -> Self {
        DirectoryNode {
            name: entry.name,
            path: entry.path,
            size: entry.size,
            sha: entry.sha,
        }
    }
}

impl GitHubSource {
    /// Create a new GitHub source
    ///
    /// Fails with `ContentError::InvalidConfig` if the API base URL can't be
    /// used as a base for request URLs
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let api_base_url = Url::parse(&config.api_base_url).map_err(|e| {
            ContentError::InvalidConfig {
                message: format!("Invalid API base URL '{}': {}", config.api_base_url, e),
            }
        })?;

        if api_base_url.cannot_be_a_base() {
            return Err(ContentError::InvalidConfig {
                message: format!("API base URL '{}' cannot be a base", config.api_base_url),
            });
        }

        let client = Client::builder().user_agent(config.user_agent).build()?;

        Ok(Self {
            client,
            api_base_url,
            token: config.token.filter(|t| !t.is_empty()),
        })
    }

    /// Build the API URL for a content listing
    fn contents_url(
        &self,
        owner: &str,
        repository: &str,
        path: Option<&str>,
        reference: Option<&str>,
    ) -> Url {
        let mut url = self.api_base_url.clone();

        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", owner, repository, "contents"])
                .extend(path.unwrap_or_default().split('/').filter(|s| !s.is_empty()));
        }

        if let Some(reference) = reference {
            url.query_pairs_mut().append_pair("ref", reference);
        }

        url
    }

    /// Attach the access token, when one is configured
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if an error is a rate limit error
    fn is_rate_limit_error(&self, status: StatusCode) -> bool {
        status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
    }

    async fn unexpected_status(&self, response: reqwest::Response, path: &str) -> ContentError {
        match response.status() {
            StatusCode::NOT_FOUND => ContentError::NotFound {
                path: path.to_string(),
            },
            status if self.is_rate_limit_error(status) => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "GitHub API rate limit exceeded".to_string());
                ContentError::RateLimited { message }
            }
            status => {
                let message = format!(
                    "Unexpected status {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                );
                ContentError::InvalidStructure { message }
            }
        }
    }
}

fn into_contents(api: ApiContents, path: &str) -> Result<Contents> {
    match api {
        ApiContents::Single(ApiNode::File(entry)) => Ok(Contents::File(entry.into())),
        ApiContents::Single(_) => Err(ContentError::InvalidStructure {
            message: format!("'{}' is neither a file nor a directory", path),
        }),
        ApiContents::Listing(nodes) => {
            let nodes = nodes
                .into_iter()
                .filter_map(|node| match node {
                    // Submodules are listed as files without a download URL
                    ApiNode::File(entry) if entry.download_url.is_none() => {
                        tracing::debug!(
                            path,
                            entry = %entry.path,
                            "Skipping file without download URL"
                        );
                        None
                    }
                    ApiNode::File(entry) => Some(ContentNode::File(entry.into())),
                    ApiNode::Dir(entry) => Some(ContentNode::Directory(entry.into())),
                    ApiNode::Unsupported => {
                        tracing::debug!(path, "Skipping unsupported listing entry");
                        None
                    }
                })
                .collect();
            Ok(Contents::Listing(nodes))
        }
    }
}

#[async_trait]
impl ContentSource for GitHubSource {
    async fn list_content(
        &self,
        owner: &str,
        repository: &str,
        path: Option<&str>,
        reference: Option<&str>,
    ) -> Result<Contents> {
        let url = self.contents_url(owner, repository, path, reference);
        let display_path = path.unwrap_or("/");

        tracing::debug!(%url, "Listing repository content");

        let response = self
            .authorized(self.client.get(url))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(self.unexpected_status(response, display_path).await);
        }

        let api: ApiContents = response.json().await?;
        into_contents(api, display_path)
    }

    async fn download(&self, file: &FileNode) -> Result<Bytes> {
        let url = file
            .download_url
            .as_deref()
            .ok_or_else(|| ContentError::InvalidStructure {
                message: format!("File '{}' has no download URL", file.path),
            })?;

        tracing::debug!(url, path = %file.path, "Downloading file");

        let response = self.authorized(self.client.get(url)).send().await?;

        if response.status() != StatusCode::OK {
            return Err(self.unexpected_status(response, &file.path).await);
        }

        Ok(response.bytes().await?)
    }

    fn identifier(&self) -> String {
        format!("github+{}", self.api_base_url)
    }
}
