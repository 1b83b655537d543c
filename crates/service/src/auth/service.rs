use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use models::types::Role;
use std::sync::Arc;
use tracing::{info, instrument};

use super::domain::{AccountProfile, AuthSession, Identity, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::{AccountRecord, AccountRepository, NewAccount};
use super::token::TokenService;

const MIN_PASSWORD_LEN: usize = 8;

/// Account registration, login and lifecycle for both roles.
pub struct AccountService<R: AccountRepository> {
    repo: R,
    tokens: Arc<TokenService>,
}

fn profile(record: &AccountRecord) -> AccountProfile {
    AccountProfile {
        username: record.username.clone(),
        name: record.name.clone(),
        email: record.email.clone(),
        department: record.department.clone(),
        role: record.role,
        subscription_expiry_date: record.subscription_expiry_date,
    }
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repo: R, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(
        &self,
        role: Role,
        input: RegisterInput,
    ) -> Result<AccountProfile, AuthError> {
        if input.username.trim().is_empty() {
            return Err(AuthError::Validation("Username must not be empty.".into()));
        }
        if !input.email.contains('@') {
            return Err(AuthError::Validation("Invalid email address.".into()));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();

        let record = self
            .repo
            .create(
                role,
                &NewAccount {
                    username: input.username,
                    name: input.name,
                    email: input.email,
                    password_hash,
                    department: input.department,
                },
            )
            .await?;
        info!(account_id = %record.id, "account_registered");
        Ok(profile(&record))
    }

    /// Verify credentials and mint an identity token. Unknown accounts and
    /// wrong passwords are indistinguishable to the caller.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, role: Role, input: LoginInput) -> Result<AuthSession, AuthError> {
        let record = self
            .repo
            .find_by_username(role, &input.username)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        Argon2::default()
            .verify_password(input.password.as_bytes(), &parsed)
            .map_err(|_| AuthError::Unauthorized)?;

        let access_token = self.tokens.issue(record.id, record.role)?;
        info!(account_id = %record.id, "login_succeeded");
        Ok(AuthSession {
            profile: profile(&record),
            access_token,
        })
    }

    #[instrument(skip(self))]
    pub async fn extend_subscription(
        &self,
        username: &str,
        days: i64,
    ) -> Result<AccountProfile, AuthError> {
        if days <= 0 {
            return Err(AuthError::Validation(
                "Extension must be a positive number of days.".into(),
            ));
        }
        let record = self.repo.extend_subscription(username, days).await?;
        info!(account_id = %record.id, days, "subscription_extended");
        Ok(profile(&record))
    }

    /// Non-admin callers may only remove their own account.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn remove_account(
        &self,
        caller: &Identity,
        role: Role,
        username: &str,
    ) -> Result<(), AuthError> {
        if !caller.is_admin() {
            let record = self
                .repo
                .find_by_username(role, username)
                .await?
                .ok_or(AuthError::NotFound)?;
            if record.id != caller.id {
                return Err(AuthError::Forbidden);
            }
        }
        self.repo.delete(role, username).await?;
        info!("account_removed");
        Ok(())
    }
}
