use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// One failed input check, surfaced in the 422 `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every failure a handler or extractor can surface to a client.
///
/// Auth failures are deliberately coarse: `BadCredentials` is returned for
/// both "no such user" and "wrong password" so responses never reveal which
/// usernames exist.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("no token provided")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid credentials")]
    BadCredentials,

    #[error("username already exists")]
    Conflict,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors })))
                    .into_response();
            }
            ApiError::MissingToken => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::InvalidToken => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::BadCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            ApiError::Conflict => (StatusCode::CONFLICT, "Username already exists"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "User not found"),
            ApiError::Internal(e) => {
                // Full chain server-side only; the client gets a fixed message.
                error!(error = ?e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "message": message, "success": false }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_expected_status_codes() {
        assert_eq!(
            ApiError::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidToken.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::BadCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Conflict.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_returns_unprocessable_entity() {
        let err = ApiError::Validation(vec![FieldError {
            field: "password",
            message: "Password must be at least 6 characters long",
        }]);
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn field_error_serializes_field_and_message() {
        let err = FieldError {
            field: "username",
            message: "Username is required",
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"field\":\"username\""));
        assert!(json.contains("\"message\":\"Username is required\""));
    }
}
