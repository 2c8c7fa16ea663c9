//! Optional bearer-token gate (§6 `[server].api_token`).
//!
//! An empty `api_token` in config disables auth entirely — every request
//! passes through. A non-empty token requires an exact
//! `Authorization: Bearer <token>` match.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let expected = &state.config.server.api_token;
    if expected.is_empty() {
        return next.run(req).await;
    }

    let authorized = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    if authorized {
        next.run(req).await
    } else {
        axum::response::IntoResponse::into_response(ApiError::Unauthorized)
    }
}
