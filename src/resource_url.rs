//! Parsing of human-facing GitHub URLs into [`RepositoryCoordinates`].
//!
//! Accepted shapes:
//!
//! ```text
//! https://github.com/{owner}/{repository}
//! https://github.com/{owner}/{repository}/{tree|blob}/{ref}
//! https://github.com/{owner}/{repository}/{tree|blob}/{ref}/{path...}
//! ```
//!
//! Only the shape is checked here. Whether the path exists, and whether it
//! is a file or a directory, is discovered when the content is listed.

use url::Url;

use crate::{
    error::{ContentError, Result},
    types::{RepositoryCoordinates, ResourceKind},
};

/// Host every resource URL must point at
pub const GITHUB_HOST: &str = "github.com";

const FORMAT_MESSAGE: &str =
    "URL must satisfy the format '/{owner}/{repository}/{blob|tree}/{ref}/{path}'";

/// Parse a repository URL into coordinates
///
/// Returns `ContentError::Validation` when the URL is malformed, points at a
/// different host, has no path, or does not follow the route grammar.
pub fn resolve(url: &str) -> Result<RepositoryCoordinates> {
    let parsed = Url::parse(url).map_err(|_| ContentError::validation("URL is not valid"))?;

    if parsed.host_str() != Some(GITHUB_HOST) {
        return Err(ContentError::validation(format!(
            "URL hostname must be '{}'",
            GITHUB_HOST
        )));
    }

    let route = parsed.path();
    if route.is_empty() || route == "/" {
        return Err(ContentError::validation("URL route path cannot be empty"));
    }

    parse_route(route)
}

/// Match a URL path against `/{owner}/{repository}[/{kind}/{ref}[/{path}]]`
fn parse_route(route: &str) -> Result<RepositoryCoordinates> {
    let rest = route.strip_prefix('/').ok_or_else(format_error)?;

    let (owner, rest) = next_segment(rest);
    let (repository, rest) = next_segment(rest.unwrap_or_default());
    if owner.is_empty() || repository.is_empty() {
        return Err(format_error());
    }

    let mut coordinates = RepositoryCoordinates::new(decode(owner)?, decode(repository)?);

    // Nothing after the repository, or only a trailing slash
    let rest = match rest {
        None | Some("") => return Ok(coordinates),
        Some(rest) => rest,
    };

    let (kind_segment, rest) = next_segment(rest);
    // A segment that is not a kind would be a ref without one
    let kind = ResourceKind::from_segment(kind_segment).ok_or_else(format_error)?;

    let (ref_segment, rest) = next_segment(rest.unwrap_or_default());
    if ref_segment.is_empty() {
        return Err(format_error());
    }
    coordinates = coordinates.with_ref(kind, decode(ref_segment)?);

    // Doubled slashes after the ref don't belong to the path
    match rest.map(|path| path.trim_start_matches('/')) {
        None | Some("") => Ok(coordinates),
        Some(path) => Ok(coordinates.with_path(decode(path)?)),
    }
}

/// Split off the first slash-delimited segment
fn next_segment(input: &str) -> (&str, Option<&str>) {
    match input.split_once('/') {
        Some((segment, rest)) => (segment, Some(rest)),
        None => (input, None),
    }
}

fn decode(segment: &str) -> Result<String> {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ContentError::validation("URL contains an invalid percent-encoded sequence"))
}

fn format_error() -> ContentError {
    ContentError::validation(FORMAT_MESSAGE)
}
