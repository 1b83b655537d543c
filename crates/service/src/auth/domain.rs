use chrono::{DateTime, Utc};
use models::types::Role;
use serde::Serialize;
use uuid::Uuid;

/// The authenticated caller, decoded from the identity token. Attached to
/// requests once the guard admits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account fields safe to return to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub username: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub profile: AccountProfile,
    pub access_token: String,
}
