use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

use super::{ApiError, AppState, DownloadParams};
use crate::{
    archive::{archive_stream, entries_for_outcome},
    fetcher::FetchSession,
    filename::derive_filename,
    resource_url::resolve,
    types::FetchOutcome,
};

/// `GET /api/download`
///
/// A single file is sent as-is unless a zip was requested. Directories are
/// always zipped.
pub(super) async fn download(
    State(state): State<AppState>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let url = params.required_url()?;
    let coordinates = resolve(url)?;
    let fallback_filename = derive_filename(&coordinates);

    tracing::info!(
        owner = %coordinates.owner,
        repository = %coordinates.repository,
        reference = ?coordinates.ref_name(),
        path = ?coordinates.path(),
        "Download requested"
    );

    let session = FetchSession::for_coordinates(state.source.clone(), &coordinates)
        .with_max_concurrency(state.max_concurrency);
    let outcome = session
        .start()
        .await
        .map_err(|error| ApiError::from_fetch_error(error, &coordinates))?;

    match outcome {
        FetchOutcome::File(file) if !params.zip_requested() => {
            let filename = params
                .filename_override()
                .map(String::from)
                .unwrap_or(fallback_filename);

            Ok((
                [
                    (
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/octet-stream"),
                    ),
                    (header::CONTENT_DISPOSITION, content_disposition(&filename)),
                ],
                Body::from(file.content),
            )
                .into_response())
        }
        outcome => {
            let filename = params
                .filename_override()
                .map(String::from)
                .unwrap_or_else(|| format!("{}.zip", fallback_filename));
            let entries = entries_for_outcome(&outcome, coordinates.path());

            Ok((
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
                    (header::CONTENT_DISPOSITION, content_disposition(&filename)),
                ],
                Body::from_stream(archive_stream(entries)),
            )
                .into_response())
        }
    }
}

/// `attachment; filename="..."` header for a download
///
/// Characters that can't appear in a quoted ASCII filename are replaced,
/// and the exact name is added as an RFC 5987 `filename*` when it differs.
pub fn content_disposition(filename: &str) -> HeaderValue {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let value = if ascii == filename {
        format!("attachment; filename=\"{}\"", ascii)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            urlencoding::encode(filename)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_filename() {
        assert_eq!(
            content_disposition("README.md"),
            "attachment; filename=\"README.md\""
        );
    }

    #[test]
    fn test_quotes_are_replaced() {
        assert_eq!(
            content_disposition("a\"b.txt"),
            "attachment; filename=\"a_b.txt\"; filename*=UTF-8''a%22b.txt"
        );
    }

    #[test]
    fn test_non_ascii_filename() {
        assert_eq!(
            content_disposition("résumé.pdf"),
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }
}
