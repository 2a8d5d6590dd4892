//! Password login with failed-attempt lockout.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::{
    LoginAttemptStore, LoginAttemptStoreError, LoginService, UserRepository,
};
use crate::domain::{EmailAddress, Error, LockoutPolicy, LoginCredentials, UserAccount, UserId};

fn map_attempt_error(error: LoginAttemptStoreError) -> Error {
    match error {
        LoginAttemptStoreError::Backend { message } => {
            Error::service_unavailable(format!("login attempt store unavailable: {message}"))
        }
    }
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

fn account_locked() -> Error {
    Error::forbidden("account locked")
}

/// Check `password` against an Argon2 PHC string.
///
/// Malformed hashes never verify.
pub fn verify_password(phc: &str, password: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

/// Hash a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;

    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| Error::internal(format!("failed to encode salt: {err}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::internal(format!("failed to hash password: {err}")))
}

/// Login service backed by the user repository and a failure counter.
#[derive(Clone)]
pub struct PasswordLoginService<U, A> {
    users: Arc<U>,
    attempts: Arc<A>,
    policy: LockoutPolicy,
}

impl<U, A> PasswordLoginService<U, A> {
    /// Create a login service with the default lockout policy.
    pub fn new(users: Arc<U>, attempts: Arc<A>) -> Self {
        Self::with_policy(users, attempts, LockoutPolicy::default())
    }

    pub fn with_policy(users: Arc<U>, attempts: Arc<A>, policy: LockoutPolicy) -> Self {
        Self {
            users,
            attempts,
            policy,
        }
    }
}

impl<U, A> PasswordLoginService<U, A>
where
    U: UserRepository,
    A: LoginAttemptStore,
{
    async fn record_failure(&self, email: &EmailAddress) -> Result<Error, Error> {
        let attempts = self
            .attempts
            .record_failure(email, self.policy.window)
            .await
            .map_err(map_attempt_error)?;
        if !self.policy.is_exceeded(attempts) {
            return Ok(invalid_credentials());
        }

        let deactivated = self
            .users
            .set_active(email, false)
            .await
            .map_err(Error::from)?;
        if deactivated {
            warn!(attempts, "account locked after repeated login failures");
        }
        Ok(account_locked())
    }

    async fn reset_failures(&self, account: &UserAccount) {
        if let Err(err) = self.attempts.reset(&account.email).await {
            warn!(user_id = %account.id, error = %err, "failed to reset login attempts");
        }
    }
}

#[async_trait]
impl<U, A> LoginService for PasswordLoginService<U, A>
where
    U: UserRepository,
    A: LoginAttemptStore,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let email = credentials.email();
        let account = self
            .users
            .find_by_email(email)
            .await
            .map_err(Error::from)?;

        let verified = account
            .filter(|account| verify_password(&account.password_hash, credentials.password()));
        match verified {
            Some(account) if account.is_active => {
                self.reset_failures(&account).await;
                Ok(account.id)
            }
            Some(_) => Err(account_locked()),
            None => Err(self.record_failure(email).await?),
        }
    }

    async fn unlock_account(&self, email: &EmailAddress) -> Result<bool, Error> {
        let found = self
            .users
            .set_active(email, true)
            .await
            .map_err(Error::from)?;
        self.attempts
            .reset(email)
            .await
            .map_err(map_attempt_error)?;
        Ok(found)
    }
}
