//! Shared helpers for router-level tests over the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::jwt::JwtKeys,
    config::{AppConfig, JwtConfig},
    state::AppState,
    users::repo_types::{NewUser, Role, User},
};

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        host: "127.0.0.1".into(),
        port: 0,
    }
}

pub fn test_app() -> (AppState, Router) {
    let state = AppState::in_memory(Arc::new(test_config()));
    let app = build_app(state.clone());
    (state, app)
}

/// Inserts a profile directly (so admins can exist) and returns an access token for it.
pub async fn seed_user(state: &AppState, email: &str, role: Role) -> (User, String) {
    let user = state
        .users
        .insert_if_absent(NewUser {
            email: email.into(),
            display_name: "Tester".into(),
            photo_url: format!("https://img/{email}.png"),
            password_hash: "unused".into(),
            role,
        })
        .await
        .expect("insert user")
        .expect("email is new");
    let token = JwtKeys::from(&state.config.jwt)
        .sign_access(user.id)
        .expect("sign access");
    (user, token)
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Sends one request; JSON bodies are parsed, anything else comes back as a string value.
pub async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("infallible router");
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}
