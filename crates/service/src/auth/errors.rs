use thiserror::Error;

/// Failures raised while authenticating callers or managing accounts.
/// The display strings are the client-facing messages.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token not found. Expected access token in request header.")]
    MissingToken,

    #[error("Invalid token. Please re-authenticate to obtain a new access token.")]
    TokenExpired,

    #[error("Invalid token. Please include a valid access token in request header.")]
    InvalidToken,

    #[error("Access denied. User is not authorized to access this resource.")]
    Forbidden,

    #[error("Invalid username or password.")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Account not found.")]
    NotFound,

    #[error("hashing error: {0}")]
    Hash(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("repository error: {0}")]
    Repository(String),
}
