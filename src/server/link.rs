use axum::{
    extract::{rejection::QueryRejection, Query},
    Json,
};
use serde::Serialize;
use url::form_urlencoded;

use super::{ApiError, DownloadParams};
use crate::{
    filename::derive_filename,
    resource_url::resolve,
    types::{RepositoryCoordinates, ResourceKind},
};

/// What a download link for a resource will look like
///
/// Computed from the URL alone, without contacting GitHub, so the
/// directory guess relies on the URL shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub download_url: String,
    pub filename: String,
    pub zip: bool,
    pub owner: String,
    pub repository: String,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub path: Option<String>,
}

/// `GET /api/link`
pub(super) async fn link(
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Json<LinkPreview>, ApiError> {
    let Query(params) = params?;
    Ok(Json(preview(&params)?))
}

pub fn preview(params: &DownloadParams) -> Result<LinkPreview, ApiError> {
    let url = params.required_url()?;
    let coordinates = resolve(url)?;

    let directory = looks_like_directory(&coordinates);
    let zip = params.zip_requested() || directory;

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("url", url);
    if let Some(filename) = params.filename_override() {
        query.append_pair("filename", filename);
    }
    if params.zip_requested() && !directory {
        query.append_pair("zip", "true");
    }

    let filename = match params.filename_override() {
        Some(filename) => filename.to_string(),
        None if zip => format!("{}.zip", derive_filename(&coordinates)),
        None => derive_filename(&coordinates),
    };

    Ok(LinkPreview {
        download_url: format!("/api/download?{}", query.finish()),
        filename,
        zip,
        reference: coordinates.ref_name().map(String::from),
        path: coordinates.path().map(String::from),
        owner: coordinates.owner,
        repository: coordinates.repository,
    })
}

fn looks_like_directory(coordinates: &RepositoryCoordinates) -> bool {
    coordinates.path().is_none() || coordinates.kind() == Some(ResourceKind::Tree)
}
