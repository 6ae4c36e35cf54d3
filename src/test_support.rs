//! Shared helpers for router tests.

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{config::Config, create_app, db::Database, state::AppState};

pub const TEST_EMAIL: &str = "owner@site.dev";
pub const TEST_PASSWORD: &str = "correct-horse";

/// In-memory state with uploads under `upload_dir` and rate limiting off.
pub fn test_state(upload_dir: &Path, tweak: impl FnOnce(&mut Config)) -> AppState {
    let mut config = Config {
        admin_email: TEST_EMAIL.to_string(),
        admin_password: TEST_PASSWORD.to_string(),
        session_secret: "test-session-secret".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        ..Config::default()
    };
    config.rate_limit.enabled = false;
    tweak(&mut config);
    AppState::new(config, Database::Memory).unwrap()
}

/// The full router over fresh in-memory stores. Keep the `TempDir` alive for
/// as long as uploads should exist.
pub fn test_app() -> (Router, AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), |_| {});
    (create_app(state.clone()), state, dir)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in with the test credentials and return a `Cookie` header value.
pub async fn login(app: &Router) -> String {
    let request = Request::post("/admin/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "email={}&password={}",
            TEST_EMAIL.replace('@', "%40"),
            TEST_PASSWORD
        )))
        .unwrap();
    let response = send(app, request).await;
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login did not set a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Hand-built `multipart/form-data` body.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----portfolio-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, method: &str, uri: &str, cookie: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(self.body))
            .unwrap()
    }
}
