use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Which unique index fired. Conflict responses are derived from this, never
/// from the driver's message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueViolation {
    ServiceAddress,
    ServiceTypeVersion,
    EndpointRoute,
    EndpointTask,
    Username,
    Email,
}

impl UniqueViolation {
    /// Map a duplicate-key failure to the index that fired. Postgres reports
    /// the constraint name, which we control in the migrations.
    fn from_constraint(detail: &str) -> Option<Self> {
        if detail.contains("uniq_service_base_address") {
            Some(Self::ServiceAddress)
        } else if detail.contains("uniq_service_type_version") {
            Some(Self::ServiceTypeVersion)
        } else if detail.contains("uniq_endpoint_route") {
            Some(Self::EndpointRoute)
        } else if detail.contains("uniq_endpoint_task") {
            Some(Self::EndpointTask)
        } else if detail.contains("uniq_user_username") || detail.contains("uniq_admin_username") {
            Some(Self::Username)
        } else if detail.contains("uniq_user_email") || detail.contains("uniq_admin_email") {
            Some(Self::Email)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unique constraint violated")]
    Unique(UniqueViolation),
    #[error("database error: {0}")]
    Db(String),
}

impl From<DbErr> for ModelError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            if let Some(violation) = UniqueViolation::from_constraint(&detail) {
                return ModelError::Unique(violation);
            }
        }
        ModelError::Db(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_service_address_constraint() {
        let detail = r#"duplicate key value violates unique constraint "uniq_service_base_address""#;
        assert_eq!(
            UniqueViolation::from_constraint(detail),
            Some(UniqueViolation::ServiceAddress)
        );
    }

    #[test]
    fn classifies_endpoint_constraints() {
        assert_eq!(
            UniqueViolation::from_constraint("uniq_endpoint_task"),
            Some(UniqueViolation::EndpointTask)
        );
        assert_eq!(
            UniqueViolation::from_constraint("uniq_endpoint_route"),
            Some(UniqueViolation::EndpointRoute)
        );
    }

    #[test]
    fn unknown_constraint_is_not_classified() {
        assert_eq!(UniqueViolation::from_constraint("uniq_something_else"), None);
    }
}
