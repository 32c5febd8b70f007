#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use hospital_records::{app, ensure_schema, AppState, ServerConfig};
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub fn sqlite_config(dir: &TempDir) -> ServerConfig {
    let path = dir.path().join("hospital.db");
    ServerConfig {
        database_url: format!("sqlite://{}?mode=rwc", path.display()),
        connect_retries: 1,
        retry_delay: Duration::ZERO,
        max_connections: 4,
        ..ServerConfig::default()
    }
}

/// Router over a fresh file-backed SQLite database with the schema in place.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&dir);
    let state = AppState::from_config(&config).unwrap();
    ensure_schema(&state.gateway).await.unwrap();
    TestApp {
        router: app(state.clone(), &config),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.raw(request).await
    }

    pub async fn raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Create a row through the API and return its primary key.
    pub async fn create(&self, table: &str, body: Value) -> i64 {
        let (status, json) = self.post(&format!("/api/crud/{}", table), body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["data"]["ID"].as_i64().unwrap()
    }
}
