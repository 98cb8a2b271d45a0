//! # V1 API Key Authentication Middleware
//!
//! Protects all v1 API routes (except explicitly public ones like `/health`)
//! with Bearer token authentication. Each token configured in
//! `AIDECK_API_KEYS` is bound to one user and plan; the middleware resolves
//! it to an [`AuthUser`] stored in the request extensions.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;
use crate::error::AideckError;
use crate::models::Plan;

use super::response::{ApiResponse, ErrorCode};

/// The caller a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub plan: Plan,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AideckError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AideckError::Unauthorized("Authentication required".to_string()))
    }
}

/// Axum middleware that enforces Bearer token authentication for v1 API routes.
///
/// # Behavior
///
/// - If `AIDECK_API_KEYS` is empty/unset → 401. The server still starts, but
///   protected routes are locked down.
/// - If the `Authorization: Bearer <token>` header is missing or malformed → 401.
/// - If the token is not configured → 401.
/// - Otherwise the resolved [`AuthUser`] is attached and the request proceeds.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if state.config.server.api_keys.is_empty() {
        return ApiResponse::<()>::error(
            ErrorCode::Unauthorized,
            "API keys not configured. Set AIDECK_API_KEYS to enable access.",
        )
        .into_response();
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                return ApiResponse::<()>::error(
                    ErrorCode::Unauthorized,
                    "Invalid authorization header format. Expected: Bearer <token>",
                )
                .into_response();
            }
        },
        None => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Missing authorization header",
            )
            .into_response();
        }
    };

    let Some(key) = state.config.find_api_key(token) else {
        return ApiResponse::<()>::error(ErrorCode::Unauthorized, "Invalid API key")
            .into_response();
    };

    let user = AuthUser {
        user_id: key.user_id.clone(),
        plan: key.plan,
    };
    tracing::debug!(user_id = %user.user_id, plan = %user.plan, "Authenticated request");
    request.extensions_mut().insert(user);
    next.run(request).await
}
