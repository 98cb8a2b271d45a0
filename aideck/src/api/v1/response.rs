//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint answers with an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { ... },
//!   "message": "...",
//!   "pagination": { "page": 1, "limit": 20, "total": 42, "totalPages": 3, "hasNext": true, "hasPrev": false }
//! }
//! ```
//!
//! Errors set `success` to `false` and carry a machine-readable `code`, a
//! human-readable `message` and, for validation failures, field-level
//! `errors`:
//!
//! ```json
//! {
//!   "success": false,
//!   "code": "invalid_request",
//!   "message": "Validation failed",
//!   "errors": [{ "field": "importance", "message": "is out of range" }]
//! }
//! ```
//!
//! `success` is always present; every other field is omitted when empty.
//! Record ids are nanoid strings (21 characters); embedded messages and
//! assets use UUID v4.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AideckError, FieldError};
use crate::models::{Page, Pagination};

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed or failed validation. HTTP 400.
    InvalidRequest,
    /// Missing or unknown bearer token. HTTP 401.
    Unauthorized,
    /// The caller may not perform this operation. HTTP 403.
    Forbidden,
    /// The caller's plan ceiling would be exceeded. HTTP 403.
    LimitExceeded,
    /// The record does not exist or belongs to another user. HTTP 404.
    NotFound,
    /// The request conflicts with the current state of the record. HTTP 409.
    Conflict,
    /// An unexpected server-side error occurred. HTTP 500.
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::LimitExceeded => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::LimitExceeded => write!(f, "limit_exceeded"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Canonical v1 API response envelope.
///
/// The HTTP status is derived from the error code on failure, or from the
/// constructor used on success ([`ApiResponse::created`] answers 201).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip, default = "default_status")]
    status: StatusCode,
}

fn default_status() -> StatusCode {
    StatusCode::OK
}

impl<T: Serialize> ApiResponse<T> {
    fn ok_with(data: T, status: StatusCode) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
            pagination: None,
            code: None,
            status,
        }
    }

    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self::ok_with(data, StatusCode::OK)
    }

    /// Resource created response (HTTP 201).
    pub fn created(data: T) -> Self {
        Self::ok_with(data, StatusCode::CREATED)
    }

    /// Attach a human-readable message to a success response.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
            pagination: None,
            code: Some(code),
            status: code.status(),
        }
    }

    /// Validation failure with field-level detail (HTTP 400).
    pub fn invalid(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        let mut resp = Self::error(ErrorCode::InvalidRequest, message);
        resp.errors = errors;
        resp
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// One page of records with its pagination summary (HTTP 200).
    pub fn paginated(page: Page<T>) -> Self {
        let mut resp = Self::ok_with(page.items, StatusCode::OK);
        resp.pagination = Some(page.pagination);
        resp
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize v1 response");
                let body = serde_json::json!({
                    "success": false,
                    "code": "internal_error",
                    "message": "An internal error occurred"
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<AideckError> for ApiResponse<T> {
    /// Convert an [`AideckError`] into a v1 [`ApiResponse`].
    ///
    /// Internal error details are **never** leaked to the client. For
    /// `internal_error` responses, a generic message is returned and the
    /// real error is logged via `tracing::error!`.
    fn from(err: AideckError) -> Self {
        match err {
            AideckError::NotFound(msg) => ApiResponse::error(ErrorCode::NotFound, msg),
            AideckError::Validation { message, fields } => ApiResponse::invalid(message, fields),
            AideckError::Json(e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }
            AideckError::Conflict(msg) => ApiResponse::error(ErrorCode::Conflict, msg),
            AideckError::Unauthorized(msg) => ApiResponse::error(ErrorCode::Unauthorized, msg),
            AideckError::LimitExceeded(msg) => ApiResponse::error(ErrorCode::LimitExceeded, msg),
            ref internal @ (AideckError::Database(_)
            | AideckError::Io(_)
            | AideckError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

impl IntoResponse for AideckError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}
