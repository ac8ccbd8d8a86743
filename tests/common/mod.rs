#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use product_api::auth::{generate_jwt, Claims};
use product_api::config::AppConfig;
use product_api::store::MemoryDocumentStore;
use product_api::AppState;

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryDocumentStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Router wired to a fresh in-memory store
pub fn spawn_app() -> TestApp {
    let mut config = AppConfig::from_env();
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.api.max_list_limit = 100;

    let store = Arc::new(MemoryDocumentStore::new());
    let router = product_api::app(AppState::new(store.clone(), &config), &config);

    TestApp { router, store }
}

pub fn token(user: &str, admin: bool) -> String {
    generate_jwt(&Claims::new(user, admin, 1), JWT_SECRET).expect("failed to mint test token")
}

pub fn admin_token() -> String {
    token("admin-1", true)
}

pub fn user_token() -> String {
    token("user-1", false)
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Body>,
        content_type: Option<&str>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(body.unwrap_or_else(Body::empty))?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

        Ok(TestResponse {
            status,
            body: body.to_vec(),
        })
    }

    pub async fn send_json(&self, method: Method, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.send(
            method,
            uri,
            Some(token),
            Some(Body::from(body.to_string())),
            Some("application/json"),
        )
        .await
    }

    pub async fn send_text(&self, method: Method, uri: &str, token: &str, body: &str) -> Result<TestResponse> {
        self.send(
            method,
            uri,
            Some(token),
            Some(Body::from(body.to_string())),
            Some("text/plain"),
        )
        .await
    }

    /// Create a product as admin and return its id
    pub async fn create_product(&self, name: &str) -> Result<String> {
        let res = self
            .send_json(
                Method::POST,
                "/product",
                &admin_token(),
                serde_json::json!({ "name": name, "description": "", "picture": "" }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "create failed: {}", res.status);
        let id = res.json()?["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("created product has no id"))?;
        Ok(id)
    }
}
