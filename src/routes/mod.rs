pub mod activities;
pub mod health;
pub mod ml;
pub mod streams;

use axum::http::HeaderMap;
use axum::Router;

use crate::state::AppState;

/// All API routes, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(activities::router())
        .merge(streams::router())
        .merge(ml::router())
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?;
    let raw = value.to_str().ok()?;
    raw.strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
