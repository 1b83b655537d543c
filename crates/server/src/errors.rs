use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use service::auth::AuthError;
use service::ServiceError;

/// Error shape every handler returns: `{"statusCode": ..., "message": ...}`,
/// plus `expectedOptions` when a query failed schema validation.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub expected_options: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            expected_options: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "statusCode": self.status.as_u16(),
            "message": self.message,
        });
        if let (Some(expected), Some(map)) = (self.expected_options, body.as_object_mut()) {
            map.insert("expectedOptions".to_owned(), expected);
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::BadRequest(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::SchemaMismatch { message, expected } => Self {
                status: StatusCode::BAD_REQUEST,
                message,
                expected_options: Some(expected),
            },
            ServiceError::Unauthorized(msg) => Self::new(StatusCode::UNAUTHORIZED, msg),
            ServiceError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream failure");
                Self::new(StatusCode::BAD_GATEWAY, "Service request failed.")
            }
            ServiceError::Db(msg) => {
                tracing::error!(error = %msg, "database failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Hash(_)
            | AuthError::Token(_)
            | AuthError::Crypto(_)
            | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "internal auth failure");
            return Self::new(status, "Internal server error.");
        }
        Self::new(status, err.to_string())
    }
}
