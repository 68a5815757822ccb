//! Application error type mapping to HTTP status codes and a JSON body.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use rolechat_types::error::{ChatError, RoleError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Role lifecycle errors.
    Role(RoleError),
    /// Chat turn errors raised before the event stream starts.
    Chat(ChatError),
    /// A request body that could not be parsed.
    Validation(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<RoleError> for AppError {
    fn from(e: RoleError) -> Self {
        AppError::Role(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Role(RoleError::NotFound) => {
                (StatusCode::NOT_FOUND, "ROLE_NOT_FOUND", "Role not found".to_string())
            }
            AppError::Role(RoleError::InvalidName(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Role(RoleError::Upstream(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR", e.detail())
            }
            AppError::Role(e) => (StatusCode::INTERNAL_SERVER_ERROR, "ROLE_ERROR", e.to_string()),
            AppError::Chat(ChatError::RoleNotFound) => {
                (StatusCode::NOT_FOUND, "ROLE_NOT_FOUND", "Role not found".to_string())
            }
            AppError::Chat(ChatError::AgentNotBound) => (
                StatusCode::NOT_FOUND,
                "AGENT_NOT_FOUND",
                "Role or agent not found".to_string(),
            ),
            AppError::Chat(ChatError::EmptyMessage) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Message must not be empty".to_string(),
            ),
            AppError::Chat(ChatError::Storage(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg.clone())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        }
        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolechat_types::error::UpstreamError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Role(RoleError::NotFound), StatusCode::NOT_FOUND),
            (AppError::Role(RoleError::InvalidName("empty".into())), StatusCode::BAD_REQUEST),
            (AppError::Role(RoleError::Storage("disk".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Chat(ChatError::RoleNotFound), StatusCode::NOT_FOUND),
            (AppError::Chat(ChatError::AgentNotBound), StatusCode::NOT_FOUND),
            (AppError::Chat(ChatError::EmptyMessage), StatusCode::BAD_REQUEST),
            (AppError::Chat(ChatError::Storage("disk".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Validation("bad id".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(err.parts().0, expected, "{err:?}");
        }
    }

    #[test]
    fn test_upstream_error_uses_body_as_message() {
        let err = AppError::Role(RoleError::Upstream(UpstreamError::Status {
            status: 401,
            body: "bad key".into(),
        }));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "UPSTREAM_ERROR");
        assert_eq!(message, "bad key");
    }
}
