//! Error taxonomy shared by the registry, dispatcher and ledger.

use models::errors::{ModelError, UniqueViolation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    /// Supplied query options do not line up with the endpoint's declared
    /// schema. Carries the declared schema so callers can see what was
    /// expected.
    #[error("{message}")]
    SchemaMismatch {
        message: String,
        expected: serde_json::Value,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("downstream request failed: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Stable wording for each unique-index collision, matched by constraint
/// name rather than by sniffing driver message strings.
fn conflict_message(violation: &UniqueViolation) -> &'static str {
    match violation {
        UniqueViolation::ServiceAddress => {
            "Service with the same base address already registered"
        }
        UniqueViolation::ServiceTypeVersion => {
            "Service with the same type and version already registered"
        }
        UniqueViolation::EndpointTask => "Task already exist for the service",
        UniqueViolation::EndpointRoute => "Endpoint of the given method already registered",
        UniqueViolation::Username => "Username taken",
        UniqueViolation::Email => "Email taken",
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => Self::BadRequest(msg),
            ModelError::Unique(v) => Self::Conflict(conflict_message(&v).to_owned()),
            ModelError::Db(msg) => Self::Db(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_map_to_conflicts() {
        let err = ServiceError::from(ModelError::Unique(UniqueViolation::ServiceTypeVersion));
        match err {
            ServiceError::Conflict(msg) => {
                assert_eq!(msg, "Service with the same type and version already registered")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServiceError::from(ModelError::Validation("bad".into()));
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }
}
