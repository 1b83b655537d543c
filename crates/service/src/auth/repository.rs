use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::types::Role;
use uuid::Uuid;

use super::errors::AuthError;

/// Account row as the service layer sees it, independent of which table
/// (user or admin) it came from.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub role: Role,
    pub subscription_expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> Result<Option<AccountRecord>, AuthError>;

    async fn create(&self, role: Role, input: &NewAccount) -> Result<AccountRecord, AuthError>;

    /// Users only; admins carry no subscription.
    async fn extend_subscription(
        &self,
        username: &str,
        days: i64,
    ) -> Result<AccountRecord, AuthError>;

    async fn delete(&self, role: Role, username: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    /// In-memory repository for service tests.
    #[derive(Default)]
    pub struct MockAccountRepository {
        accounts: Mutex<Vec<AccountRecord>>,
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn find_by_username(
            &self,
            role: Role,
            username: &str,
        ) -> Result<Option<AccountRecord>, AuthError> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts
                .iter()
                .find(|a| a.role == role && a.username == username)
                .cloned())
        }

        async fn create(
            &self,
            role: Role,
            input: &NewAccount,
        ) -> Result<AccountRecord, AuthError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts
                .iter()
                .any(|a| a.role == role && a.username == input.username)
            {
                return Err(AuthError::Conflict("Username taken".into()));
            }
            if accounts.iter().any(|a| a.role == role && a.email == input.email) {
                return Err(AuthError::Conflict("Email taken".into()));
            }
            let record = AccountRecord {
                id: Uuid::new_v4(),
                username: input.username.clone(),
                name: input.name.clone(),
                email: input.email.clone(),
                password_hash: input.password_hash.clone(),
                department: input.department.clone(),
                role,
                subscription_expiry_date: match role {
                    Role::User => Some(Utc::now() + Duration::days(30)),
                    Role::Admin => None,
                },
            };
            accounts.push(record.clone());
            Ok(record)
        }

        async fn extend_subscription(
            &self,
            username: &str,
            days: i64,
        ) -> Result<AccountRecord, AuthError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .iter_mut()
                .find(|a| a.role == Role::User && a.username == username)
                .ok_or(AuthError::NotFound)?;
            let expiry = account
                .subscription_expiry_date
                .unwrap_or_else(Utc::now)
                + Duration::days(days);
            account.subscription_expiry_date = Some(expiry);
            Ok(account.clone())
        }

        async fn delete(&self, role: Role, username: &str) -> Result<(), AuthError> {
            let mut accounts = self.accounts.lock().unwrap();
            let before = accounts.len();
            accounts.retain(|a| !(a.role == role && a.username == username));
            if accounts.len() == before {
                return Err(AuthError::NotFound);
            }
            Ok(())
        }
    }
}
