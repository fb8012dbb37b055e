use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use camino::Utf8PathBuf;
use drivesync_core::PathOverrides;
use drivesync_infra::AccessToken;
use drivesync_pipeline::sync::remote::{DriveRemoteStore, RemoteError, RemoteStore};
use drivesync_pipeline::sync::{SyncEngine, SyncError, SyncOptions, SyncRequest};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

const TOKEN: &str = "ya29.test-token";
const FOLDER: &str = "application/vnd.google-apps.folder";

#[derive(Default)]
struct MockDrive {
    list_queries: Mutex<Vec<HashMap<String, String>>>,
    media_requests: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(HashMap<String, String>, String, Vec<u8>)>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(&format!("Bearer {TOKEN}")[..])
}

fn json(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn listing_for(folder_id: &str, page_token: Option<&str>) -> String {
    match (folder_id, page_token) {
        ("R", None) => format!(
            r#"{{"nextPageToken":"page-2","files":[{{"id":"D","name":"Docs","mimeType":"{FOLDER}"}}]}}"#
        ),
        ("R", Some("page-2")) => r#"{"files":[{"id":"F1","name":"a.txt","mimeType":"text/plain","md5Checksum":"h1"}]}"#.to_string(),
        ("D", None) => r#"{"files":[
            {"id":"F2","name":"b.txt","mimeType":"text/plain","md5Checksum":"h2"},
            {"id":"GHOST","name":"gone.txt","mimeType":"text/plain","md5Checksum":"h3"},
            {"id":"GDOC","name":"Notes","mimeType":"application/vnd.google-apps.document"}
        ]}"#
        .to_string(),
        _ => r#"{"files":[]}"#.to_string(),
    }
}

async fn list_files(
    State(mock): State<Arc<MockDrive>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing credentials").into_response();
    }
    mock.list_queries.lock().unwrap().push(params.clone());

    let q = params.get("q").cloned().unwrap_or_default();
    let Some(folder_id) = q
        .strip_suffix(" in parents")
        .and_then(|s| s.strip_prefix('\''))
        .and_then(|s| s.strip_suffix('\''))
    else {
        return (StatusCode::BAD_REQUEST, "bad query").into_response();
    };
    json(listing_for(folder_id, params.get("pageToken").map(String::as_str)))
}

async fn get_media(
    State(mock): State<Arc<MockDrive>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("alt").map(String::as_str) != Some("media") {
        return (StatusCode::BAD_REQUEST, "metadata not supported").into_response();
    }
    mock.media_requests.lock().unwrap().push(id.clone());
    match id.as_str() {
        "F1" => "alpha".into_response(),
        "F2" => "beta".into_response(),
        _ => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

async fn upload_file(
    State(mock): State<Arc<MockDrive>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing credentials").into_response();
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    mock.uploads
        .lock()
        .unwrap()
        .push((params, content_type, body.to_vec()));
    json(r#"{"id":"UP1"}"#.to_string())
}

async fn start_server() -> (SocketAddr, Arc<MockDrive>, tokio::task::JoinHandle<()>) {
    let mock = Arc::new(MockDrive::default());
    let app = Router::new()
        .route("/drive/v3/files", get(list_files))
        .route("/drive/v3/files/:id", get(get_media))
        .route("/upload/drive/v3/files", post(upload_file))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, mock, handle)
}

fn store(addr: SocketAddr, token: &str) -> DriveRemoteStore {
    DriveRemoteStore::with_base_urls(
        reqwest::Client::new(),
        AccessToken::new(token),
        &format!("http://{addr}/drive/v3"),
        &format!("http://{addr}/upload/drive/v3"),
    )
    .unwrap()
}

#[tokio::test]
async fn listing_follows_page_tokens_and_sends_drive_parameters() {
    let (addr, mock, handle) = start_server().await;

    let nodes = store(addr, TOKEN).list_children("R").await.unwrap();

    let ids: Vec<_> = nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["D", "F1"]);
    assert!(nodes[0].is_folder());
    assert_eq!(nodes[1].checksum.as_deref(), Some("h1"));

    let queries = mock.list_queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0]["q"], "'R' in parents");
    assert_eq!(queries[0]["pageSize"], "1000");
    assert_eq!(
        queries[0]["fields"],
        "nextPageToken, files(id, name, mimeType, md5Checksum)"
    );
    assert!(!queries[0].contains_key("pageToken"));
    assert_eq!(queries[1]["pageToken"], "page-2");

    handle.abort();
}

#[tokio::test]
async fn rejected_credentials_surface_as_status_error() {
    let (addr, _mock, handle) = start_server().await;

    let err = store(addr, "wrong").list_children("R").await.unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 401, .. }));
    handle.abort();
}

#[tokio::test]
async fn full_sync_against_mocked_drive() {
    let (addr, mock, handle) = start_server().await;
    let dir = tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let engine = SyncEngine::with_remote(Box::new(store(addr, TOKEN)));
    let req = SyncRequest {
        root_folder: base.join("mirror"),
        root_id: "R".into(),
        overrides: PathOverrides::new(),
        manifest_path: Some(base.join("md5.json")),
        options: SyncOptions::default(),
    };

    let result = engine.sync(&req, None).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(base.join("mirror").join("a.txt")).unwrap(),
        "alpha"
    );
    assert_eq!(
        std::fs::read_to_string(base.join("mirror").join("Docs").join("b.txt")).unwrap(),
        "beta"
    );
    assert!(!base.join("mirror").join("Docs").join("gone.txt").exists());
    assert!(!base.join("mirror").join("Docs").join("Notes").exists());

    assert_eq!(*mock.media_requests.lock().unwrap(), vec!["F1", "F2", "GHOST"]);
    assert_eq!(result.report.files_unhashed, 1);
    assert_eq!(result.report.files_failed, 1);
    assert!(matches!(
        &result.failures[..],
        [SyncError::Fetch { file_id, source: RemoteError::Status { status: 404, .. } }]
            if file_id == "GHOST"
    ));
    assert_eq!(
        std::fs::read_to_string(base.join("md5.json")).unwrap(),
        r#"{"F1":"h1","F2":"h2"}"#
    );

    handle.abort();
}

#[tokio::test]
async fn upload_posts_multipart_related_body() {
    let (addr, mock, handle) = start_server().await;
    let dir = tempdir().unwrap();
    let local = Utf8PathBuf::from_path_buf(dir.path().join("up.txt")).unwrap();
    std::fs::write(&local, b"payload bytes").unwrap();
    let engine = SyncEngine::with_remote(Box::new(store(addr, TOKEN)));

    let id = engine.upload(&local, "R").await.unwrap();
    assert_eq!(id, "UP1");

    let uploads = mock.uploads.lock().unwrap();
    let (params, content_type, body) = &uploads[0];
    assert_eq!(params["uploadType"], "multipart");
    assert!(content_type.starts_with("multipart/related; boundary="));
    let body = String::from_utf8_lossy(body);
    assert!(body.contains(r#"{"name":"up.txt","parents":["R"]}"#));
    assert!(body.contains("payload bytes"));

    handle.abort();
}
