/// HTTP behavior of the GitHub content source against a mock API server

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use gitlink::{
    router, AppState, ContentError, ContentNode, ContentSource, Contents, FetchSession,
    GitHubConfig, GitHubSource,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

fn source(server: &Server, token: Option<&str>) -> GitHubSource {
    GitHubSource::new(GitHubConfig {
        api_base_url: server.url(),
        token: token.map(String::from),
        user_agent: "gitlink-tests".to_string(),
    })
    .unwrap()
}

fn file_json(server_url: &str, path: &str, size: usize) -> serde_json::Value {
    json!({
        "type": "file",
        "name": path.rsplit('/').next().unwrap(),
        "path": path,
        "size": size,
        "sha": format!("sha-{}", path),
        "download_url": format!("{}/raw/octo/hello/main/{}", server_url, path),
    })
}

fn dir_json(path: &str) -> serde_json::Value {
    json!({
        "type": "dir",
        "name": path.rsplit('/').next().unwrap(),
        "path": path,
        "size": 0,
        "sha": format!("sha-{}", path),
        "download_url": null,
    })
}

#[tokio::test]
async fn test_lists_directory_with_ref_and_token() {
    let mut server = Server::new_async().await;
    let listing = json!([file_json(&server.url(), "docs/guide.md", 5), dir_json("docs/api")]);

    let mock = server
        .mock("GET", "/repos/octo/hello/contents/docs")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .match_header("authorization", "Bearer secret")
        .match_header("accept", "application/vnd.github.v3+json")
        .match_header("user-agent", "gitlink-tests")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing.to_string())
        .create_async()
        .await;

    let source = source(&server, Some("secret"));
    let contents = assert_ok!(
        source
            .list_content("octo", "hello", Some("docs"), Some("main"))
            .await
    );

    match contents {
        Contents::Listing(nodes) => {
            assert_eq!(nodes.len(), 2);
            assert!(matches!(&nodes[0], ContentNode::File(f) if f.name == "guide.md" && f.size == 5));
            assert!(matches!(&nodes[1], ContentNode::Directory(d) if d.path == "docs/api"));
        }
        other => panic!("Expected listing, got {:?}", other),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_downloads_file_without_token() {
    let mut server = Server::new_async().await;
    let file = file_json(&server.url(), "README.md", 7);

    let listing = server
        .mock("GET", "/repos/octo/hello/contents/README.md")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(file.to_string())
        .create_async()
        .await;
    let raw = server
        .mock("GET", "/raw/octo/hello/main/README.md")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("# Hello")
        .create_async()
        .await;

    let source = source(&server, None);
    let node = match assert_ok!(source.list_content("octo", "hello", Some("README.md"), None).await) {
        Contents::File(node) => node,
        other => panic!("Expected file, got {:?}", other),
    };
    let content = assert_ok!(source.download(&node).await);

    assert_eq!(content, bytes::Bytes::from("# Hello"));
    listing.assert_async().await;
    raw.assert_async().await;
}

#[tokio::test]
async fn test_status_mapping() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/octo/hello/contents/missing")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octo/hello/contents/limited")
        .with_status(403)
        .with_body(r#"{"message": "API rate limit exceeded"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octo/hello/contents/broken")
        .with_status(500)
        .create_async()
        .await;

    let source = source(&server, None);

    match source.list_content("octo", "hello", Some("missing"), None).await {
        Err(ContentError::NotFound { path }) => assert_eq!(path, "missing"),
        other => panic!("Expected NotFound error, got {:?}", other),
    }
    assert!(matches!(
        source.list_content("octo", "hello", Some("limited"), None).await,
        Err(ContentError::RateLimited { .. })
    ));
    assert!(matches!(
        source.list_content("octo", "hello", Some("broken"), None).await,
        Err(ContentError::InvalidStructure { .. })
    ));
}

#[tokio::test]
async fn test_network_failure() {
    // Nothing listens on port 9 of localhost
    let source = GitHubSource::new(GitHubConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        ..GitHubConfig::default()
    })
    .unwrap();

    let result = source.list_content("octo", "hello", None, None).await;
    assert!(matches!(assert_err!(result), ContentError::Network(_)));
}

#[tokio::test]
async fn test_session_walks_remote_tree() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let root = server
        .mock("GET", "/repos/octo/hello/contents")
        .with_status(200)
        .with_body(json!([file_json(&url, "a.txt", 1), dir_json("src")]).to_string())
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octo/hello/contents/src")
        .with_status(200)
        .with_body(json!([file_json(&url, "src/b.txt", 1)]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/raw/octo/hello/main/a.txt")
        .with_body("a")
        .create_async()
        .await;
    server
        .mock("GET", "/raw/octo/hello/main/src/b.txt")
        .with_body("b")
        .create_async()
        .await;

    let session = FetchSession::new(Arc::new(source(&server, None)), "octo", "hello", None, None);
    let first = assert_ok!(session.start().await);
    let second = assert_ok!(session.start().await);

    let mut paths: Vec<&str> = first.files().iter().map(|f| f.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["a.txt", "src/b.txt"]);
    assert_eq!(first, second);

    // Listed only once despite two starts
    root.assert_async().await;
}

#[tokio::test]
async fn test_download_endpoint_over_github_source() {
    let mut server = Server::new_async().await;
    let url = server.url();

    server
        .mock("GET", "/repos/octo/hello/contents/docs")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_body(json!([file_json(&url, "docs/guide.md", 5), dir_json("docs/api")]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octo/hello/contents/docs/api")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_body(json!([file_json(&url, "docs/api/index.md", 3)]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/raw/octo/hello/main/docs/guide.md")
        .with_body("Guide")
        .create_async()
        .await;
    server
        .mock("GET", "/raw/octo/hello/main/docs/api/index.md")
        .with_body("API")
        .create_async()
        .await;

    let app = router(AppState::new(Arc::new(source(&server, Some("secret"))), 2));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/download?url={}",
                    urlencoding::encode("https://github.com/octo/hello/tree/main/docs")
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let data = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(data.to_vec())).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    assert_eq!(names, vec!["api/index.md", "guide.md"]);

    let mut guide = String::new();
    archive
        .by_name("guide.md")
        .unwrap()
        .read_to_string(&mut guide)
        .unwrap();
    assert_eq!(guide, "Guide");
}

#[tokio::test]
async fn test_submodule_in_listing_does_not_fail_download() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let submodule = json!({
        "type": "file",
        "name": "vendored",
        "path": "vendored",
        "size": 0,
        "sha": "sha-vendored",
        "download_url": null,
    });
    server
        .mock("GET", "/repos/octo/hello/contents")
        .with_status(200)
        .with_body(json!([file_json(&url, "a.txt", 1), submodule]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/raw/octo/hello/main/a.txt")
        .with_body("a")
        .create_async()
        .await;

    let session = FetchSession::new(Arc::new(source(&server, None)), "octo", "hello", None, None);
    let outcome = assert_ok!(session.start().await);

    let paths: Vec<&str> = outcome.files().iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt"]);
}

#[tokio::test]
async fn test_download_endpoint_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/octo/hello/contents/nope")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let app = router(AppState::new(Arc::new(source(&server, None)), 0));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/download?url={}",
                    urlencoding::encode("https://github.com/octo/hello/blob/main/nope")
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        error["message"],
        "Path 'nope' wasn't found in octo/hello with ref = main"
    );
}
