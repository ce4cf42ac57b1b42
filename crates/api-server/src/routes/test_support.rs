//! Shared fixtures for route tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use fleet_core::access::Principal;
use fleet_core::store::FleetRepository;
use fleet_core::user::{Role, User};
use fleet_core::vessel::{Vessel, VesselStatus};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::state::AppState;

pub async fn build_state() -> (AppState, TempDir) {
    build_state_with(|_| {}).await
}

pub async fn build_state_with(configure: impl FnOnce(&mut AppConfig)) -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = AppConfig::for_tests(temp_dir.path().to_path_buf());
    configure(&mut config);
    let state = AppState::new(config).await.unwrap();
    (state, temp_dir)
}

pub fn app(state: &AppState) -> Router {
    super::router().with_state(state.clone())
}

pub async fn create_user(state: &AppState, email: &str, password: &str, role: Role) -> User {
    state
        .store()
        .create_user(User::new(email, hash_password(password), role))
        .await
        .unwrap()
}

pub async fn create_vessel(state: &AppState, name: &str, imo: &str, status: VesselStatus) -> Vessel {
    state
        .store()
        .create_vessel(Vessel::new(name, imo, "Liberia", "Container Ship").with_status(status))
        .await
        .unwrap()
}

pub fn token_for(state: &AppState, user: &User) -> String {
    let principal = Principal {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    state.tokens().issue(&principal).unwrap().0
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, payload)
}
