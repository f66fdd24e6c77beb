//! HTTP contract tests over the full router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode, header};
use ferry_core::SystemClock;
use ferry_server::FerryServer;
use ferry_settings::{FerrySettings, FileSettings};
use serde_json::Value;
use tower::ServiceExt;

const UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

struct TestApp {
    server: FerryServer,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let settings = FerrySettings {
            files: FileSettings {
                data_dir: Some(tmp.path().to_string_lossy().into_owned()),
                ..FileSettings::default()
            },
            ..FerrySettings::default()
        };
        let server = FerryServer::new(settings, Arc::new(SystemClock));
        server.state().store.ensure_dirs().await.unwrap();
        Self { server, _tmp: tmp }
    }

    fn router(&self) -> Router {
        self.server
            .router()
            .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 2], 40_000))))
    }
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::USER_AGENT, UA)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::USER_AGENT, UA)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(uri: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let boundary = "FerryTestBoundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::USER_AGENT, UA)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn session_create_then_validate() {
    let app = TestApp::new().await;

    let resp = app
        .router()
        .oneshot(post_json("/api/session/create", &serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = json_body(resp).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["isNew"], true);
    assert_eq!(created["sessionId"], 1);
    assert_eq!(created["deviceInfo"]["type"], "Mobile");
    let token = created["token"].as_str().unwrap().to_owned();

    let resp = app
        .router()
        .oneshot(post_json(
            "/api/session/validate",
            &serde_json::json!({ "token": token }),
        ))
        .await
        .unwrap();
    let validated = json_body(resp).await;
    assert_eq!(validated["valid"], true);
    assert_eq!(validated["deviceInfo"]["sourceAddress"], "10.0.0.2");
}

#[tokio::test]
async fn session_create_twice_reuses_token() {
    let app = TestApp::new().await;

    let first = json_body(
        app.router()
            .oneshot(post_json("/api/session/create", &serde_json::json!({})))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        app.router()
            .oneshot(post_json("/api/session/create", &serde_json::json!({})))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first["token"], second["token"]);
    assert_eq!(second["isNew"], false);
    assert_eq!(second["sessionId"], 1);
}

#[tokio::test]
async fn validate_unknown_token_is_false_not_error() {
    let app = TestApp::new().await;
    let resp = app
        .router()
        .oneshot(post_json(
            "/api/session/validate",
            &serde_json::json!({ "token": "bogus" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn active_sessions_lists_created() {
    let app = TestApp::new().await;
    let _ = app
        .router()
        .oneshot(post_json("/api/session/create", &serde_json::json!({})))
        .await
        .unwrap();

    let body = json_body(app.router().oneshot(get("/api/session/active")).await.unwrap()).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["sessions"][0]["deviceInfo"]["type"], "Mobile");
    assert!(body["sessions"][0]["token"].is_string());
}

#[tokio::test]
async fn devices_and_events_start_empty() {
    let app = TestApp::new().await;

    let devices = json_body(app.router().oneshot(get("/api/devices")).await.unwrap()).await;
    assert_eq!(devices, serde_json::json!([]));

    let events = json_body(app.router().oneshot(get("/api/events")).await.unwrap()).await;
    assert_eq!(events, serde_json::json!([]));

    let device_events =
        json_body(app.router().oneshot(get("/api/device-events")).await.unwrap()).await;
    assert_eq!(device_events, serde_json::json!([]));
}

#[tokio::test]
async fn upload_list_download_delete_flow() {
    let app = TestApp::new().await;

    // Upload from a phone.
    let resp = app
        .router()
        .oneshot(multipart_upload("/api/upload", "notes.txt", b"hello ferry"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let uploaded = json_body(resp).await;
    assert_eq!(uploaded["success"], true);
    let stored_name = uploaded["filename"].as_str().unwrap().to_owned();
    assert!(stored_name.starts_with("notes_"));
    assert_eq!(uploaded["sizeBytes"], 11);

    // It shows up in the listing as a phone file.
    let files = json_body(app.router().oneshot(get("/api/files")).await.unwrap()).await;
    assert_eq!(files.as_array().unwrap().len(), 1);
    assert_eq!(files[0]["source"], "phone");
    assert_eq!(files[0]["name"], stored_name.as_str());

    // The upload was recorded as a file event.
    let events = json_body(app.router().oneshot(get("/api/events")).await.unwrap()).await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["type"], "upload");
    assert_eq!(events[0]["data"]["filename"], stored_name.as_str());

    // Download it back.
    let resp = app
        .router()
        .oneshot(get(&format!("/api/download/{stored_name}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(disposition.contains("attachment"));
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello ferry");

    // Delete it.
    let resp = app
        .router()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/files/{stored_name}"))
                .header(header::USER_AGENT, UA)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let files = json_body(app.router().oneshot(get("/api/files")).await.unwrap()).await;
    assert!(files.as_array().unwrap().is_empty());

    // Now two file events: upload then delete, oldest first.
    let events = json_body(app.router().oneshot(get("/api/events")).await.unwrap()).await;
    assert_eq!(events.as_array().unwrap().len(), 2);
    assert_eq!(events[0]["type"], "upload");
    assert_eq!(events[1]["type"], "delete");
}

#[tokio::test]
async fn upload_pc_keeps_name() {
    let app = TestApp::new().await;
    let resp = app
        .router()
        .oneshot(multipart_upload("/api/upload-pc", "report.pdf", b"%PDF"))
        .await
        .unwrap();
    let uploaded = json_body(resp).await;
    assert_eq!(uploaded["filename"], "report.pdf");

    let files = json_body(app.router().oneshot(get("/api/files")).await.unwrap()).await;
    assert_eq!(files[0]["source"], "pc");
}

#[tokio::test]
async fn upload_disallowed_extension_is_rejected() {
    let app = TestApp::new().await;
    let resp = app
        .router()
        .oneshot(multipart_upload("/api/upload", "virus.exe", b"MZ"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["code"], "FILE_TYPE_NOT_ALLOWED");
}

#[tokio::test]
async fn download_missing_file_is_404() {
    let app = TestApp::new().await;
    let resp = app
        .router()
        .oneshot(get("/api/download/ghost.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_missing_file_is_404() {
    let app = TestApp::new().await;
    let resp = app
        .router()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/files/ghost.txt")
                .header(header::USER_AGENT, UA)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_filters_by_name() {
    let app = TestApp::new().await;
    let _ = app
        .router()
        .oneshot(multipart_upload("/api/upload-pc", "alpha.txt", b"a"))
        .await
        .unwrap();
    let _ = app
        .router()
        .oneshot(multipart_upload("/api/upload-pc", "beta.txt", b"b"))
        .await
        .unwrap();

    let found = json_body(
        app.router()
            .oneshot(get("/api/files/search?q=alpha"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "alpha.txt");
}

#[tokio::test]
async fn cleanup_deletes_old_files() {
    let app = TestApp::new().await;
    let _ = app
        .router()
        .oneshot(multipart_upload("/api/upload-pc", "stale.txt", b"x"))
        .await
        .unwrap();

    let body = json_body(
        app.router()
            .oneshot(post_json(
                "/api/files/cleanup",
                &serde_json::json!({ "hours": 0 }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["deletedCount"], 1);
}

#[tokio::test]
async fn config_exposes_client_settings() {
    let app = TestApp::new().await;
    let body = json_body(app.router().oneshot(get("/api/config")).await.unwrap()).await;
    assert_eq!(body["maxUploadBytes"], 0);
    assert_eq!(body["autoRefreshIntervalSecs"], 10);
    assert!(
        body["allowedExtensions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "pdf")
    );
}

#[tokio::test]
async fn system_info_reports_counts() {
    let app = TestApp::new().await;
    let _ = app
        .router()
        .oneshot(post_json("/api/session/create", &serde_json::json!({})))
        .await
        .unwrap();
    let _ = app
        .router()
        .oneshot(multipart_upload("/api/upload-pc", "a.txt", b"x"))
        .await
        .unwrap();

    let body = json_body(app.router().oneshot(get("/api/system-info")).await.unwrap()).await;
    assert_eq!(body["activeSessions"], 1);
    assert_eq!(body["connectedDevices"], 0);
    assert_eq!(body["downloadFiles"], 1);
    assert_eq!(body["totalFiles"], 1);
    assert!(body["localIp"].is_string());
    assert!(body["serverTime"].is_string());
}

#[tokio::test]
async fn qr_endpoint_renders_svg() {
    let app = TestApp::new().await;
    let body = json_body(app.router().oneshot(get("/api/qr")).await.unwrap()).await;
    assert!(body["svg"].as_str().unwrap().contains("<svg"));
    assert!(body["serverUrl"].as_str().unwrap().starts_with("http://"));
    assert!(body["localIp"].is_string());
}

#[tokio::test]
async fn health_reflects_session_count() {
    let app = TestApp::new().await;
    let _ = app
        .router()
        .oneshot(post_json("/api/session/create", &serde_json::json!({})))
        .await
        .unwrap();

    let body = json_body(app.router().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 1);
    assert_eq!(body["connections"], 0);
}
