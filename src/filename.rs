use crate::types::RepositoryCoordinates;

/// Default download filename for a resource
///
/// The last segment of the path, or the repository name when the URL
/// pointed at the repository root.
pub fn derive_filename(coordinates: &RepositoryCoordinates) -> String {
    let path = coordinates
        .path()
        .map(|p| p.strip_suffix('/').unwrap_or(p))
        .unwrap_or_default();

    if path.is_empty() {
        return coordinates.repository.clone();
    }

    match path.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => path.to_string(),
    }
}
