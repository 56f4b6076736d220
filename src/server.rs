//! HTTP boundary: routes, shared state and query parameters.

use std::sync::Arc;

use axum::{response::Html, routing::get, Router};
use serde::Deserialize;

use crate::source::ContentSource;

mod download;
mod error;
mod link;

pub use error::ApiError;
pub use link::LinkPreview;

const INDEX_HTML: &str = include_str!("server/index.html");

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn ContentSource>,
    /// Per-session cap on in-flight remote calls, `0` for unlimited
    max_concurrency: usize,
}

impl AppState {
    pub fn new(source: Arc<dyn ContentSource>, max_concurrency: usize) -> Self {
        Self {
            source,
            max_concurrency,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/download", get(download::download))
        .route("/api/link", get(link::link))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Query string accepted by the download and link endpoints
#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub url: Option<String>,
    pub filename: Option<String>,
    pub zip: Option<String>,
}

impl DownloadParams {
    /// The resource URL, which every request must carry
    pub fn required_url(&self) -> Result<&str, ApiError> {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ApiError::bad_request(
                "ValidationError: Query parameter 'url' is required",
            )),
        }
    }

    pub fn filename_override(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.is_empty())
    }

    /// Whether the caller asked for a zip even for a single file
    pub fn zip_requested(&self) -> bool {
        self.zip.as_deref().map(parse_flag).unwrap_or(false)
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value.eq_ignore_ascii_case("off"))
}
