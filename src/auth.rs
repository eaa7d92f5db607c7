// SPDX-License-Identifier: Apache-2.0
//! Bearer-token authentication for the admin API

use crate::handlers::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Require a valid admin bearer token on the request.
///
/// When no token is configured the admin API stays disabled and every
/// request is rejected.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    let Some(expected) = state.config.admin.token.as_deref() else {
        debug!("Admin request rejected: no admin token configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            debug!("Admin request rejected: missing or invalid bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
