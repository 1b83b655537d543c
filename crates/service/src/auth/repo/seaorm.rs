use async_trait::async_trait;
use models::errors::{ModelError, UniqueViolation};
use models::types::Role;
use models::{admin, user};
use sea_orm::DatabaseConnection;

use crate::auth::errors::AuthError;
use crate::auth::repository::{AccountRecord, AccountRepository, NewAccount};

pub struct SeaOrmAccountRepository {
    db: DatabaseConnection,
}

impl SeaOrmAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_model_err(err: ModelError) -> AuthError {
    match err {
        ModelError::Validation(msg) => AuthError::Validation(msg),
        ModelError::Unique(UniqueViolation::Username) => AuthError::Conflict("Username taken".into()),
        ModelError::Unique(UniqueViolation::Email) => AuthError::Conflict("Email taken".into()),
        other => AuthError::Repository(other.to_string()),
    }
}

fn from_user(m: user::Model) -> AccountRecord {
    AccountRecord {
        id: m.id,
        username: m.username,
        name: m.name,
        email: m.email,
        password_hash: m.password_hash,
        department: m.department,
        role: Role::User,
        subscription_expiry_date: Some(m.subscription_expiry_date.to_utc()),
    }
}

fn from_admin(m: admin::Model) -> AccountRecord {
    AccountRecord {
        id: m.id,
        username: m.username,
        name: m.name,
        email: m.email,
        password_hash: m.password_hash,
        department: m.department,
        role: Role::Admin,
        subscription_expiry_date: None,
    }
}

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn find_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> Result<Option<AccountRecord>, AuthError> {
        match role {
            Role::User => Ok(user::find_by_username(&self.db, username)
                .await
                .map_err(map_model_err)?
                .map(from_user)),
            Role::Admin => Ok(admin::find_by_username(&self.db, username)
                .await
                .map_err(map_model_err)?
                .map(from_admin)),
        }
    }

    async fn create(&self, role: Role, input: &NewAccount) -> Result<AccountRecord, AuthError> {
        match role {
            Role::User => user::create(
                &self.db,
                &input.username,
                &input.name,
                &input.email,
                &input.password_hash,
                &input.department,
            )
            .await
            .map(from_user)
            .map_err(map_model_err),
            Role::Admin => admin::create(
                &self.db,
                &input.username,
                &input.name,
                &input.email,
                &input.password_hash,
                &input.department,
            )
            .await
            .map(from_admin)
            .map_err(map_model_err),
        }
    }

    async fn extend_subscription(
        &self,
        username: &str,
        days: i64,
    ) -> Result<AccountRecord, AuthError> {
        let account = user::find_by_username(&self.db, username)
            .await
            .map_err(map_model_err)?
            .ok_or(AuthError::NotFound)?;
        user::extend_subscription(&self.db, account, days)
            .await
            .map(from_user)
            .map_err(map_model_err)
    }

    async fn delete(&self, role: Role, username: &str) -> Result<(), AuthError> {
        match role {
            Role::User => {
                let account = user::find_by_username(&self.db, username)
                    .await
                    .map_err(map_model_err)?
                    .ok_or(AuthError::NotFound)?;
                user::hard_delete(&self.db, account.id).await.map_err(map_model_err)
            }
            Role::Admin => {
                let account = admin::find_by_username(&self.db, username)
                    .await
                    .map_err(map_model_err)?
                    .ok_or(AuthError::NotFound)?;
                admin::hard_delete(&self.db, account.id).await.map_err(map_model_err)
            }
        }
    }
}
