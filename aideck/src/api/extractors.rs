use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum_extra::extract::QueryRejection;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AideckError;

/// JSON body whose rejections use the v1 error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AideckError))]
pub struct AppJson<T>(pub T);

/// Query string whose rejections use the v1 error envelope. Repeated keys
/// are accepted by the underlying `axum_extra` extractor.
#[derive(FromRequestParts)]
#[from_request(via(axum_extra::extract::Query), rejection(AideckError))]
pub struct AppQuery<T>(pub T);

/// JSON body that has additionally passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AideckError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AideckError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

impl From<QueryRejection> for AideckError {
    fn from(rejection: QueryRejection) -> Self {
        AideckError::validation(format!("Invalid query string: {rejection}"))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> AideckError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                AideckError::invalid_field(field, "is required")
            } else {
                AideckError::validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            AideckError::validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            AideckError::validation("Missing `Content-Type: application/json` header")
        }
        JsonRejection::BytesRejection(err) => {
            AideckError::validation(format!("Request body rejected: {}", err.body_text()))
        }
        _ => AideckError::validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        let msg = "Failed to deserialize the JSON body into the target type: missing field `key` at line 1 column 2";
        assert_eq!(extract_missing_field(msg), Some("key"));
    }

    #[test]
    fn no_missing_field_in_other_errors() {
        assert_eq!(extract_missing_field("invalid type: integer"), None);
    }
}
