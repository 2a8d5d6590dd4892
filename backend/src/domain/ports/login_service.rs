//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to authenticate credentials without knowing the
//! account store or the lockout counters behind it.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, LoginCredentials, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    ///
    /// Unknown emails and wrong passwords both fail with `unauthorized`;
    /// locked or inactive accounts fail with `forbidden`.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;

    /// Reactivate a locked account and clear its failure counter.
    ///
    /// Returns `false` when no account has that email.
    async fn unlock_account(&self, email: &EmailAddress) -> Result<bool, Error>;
}
