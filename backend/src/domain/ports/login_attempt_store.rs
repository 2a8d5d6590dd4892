//! Port for counting failed logins within a sliding lockout window.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by login attempt stores.
    pub enum LoginAttemptStoreError {
        /// The backing store could not be reached.
        Backend { message: String } => "login attempt store unavailable: {message}",
    }
}

/// Cache key under which failures for `email` are counted.
pub fn login_attempts_key(email: &EmailAddress) -> String {
    format!("login_attempts_{email}")
}

/// Failure counter keyed by normalised email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    /// Count one failure and return the total inside the window. The window
    /// starts at the first failure and the counter expires with it.
    async fn record_failure(
        &self,
        email: &EmailAddress,
        window: Duration,
    ) -> Result<u32, LoginAttemptStoreError>;

    /// Forget every recorded failure for `email`.
    async fn reset(&self, email: &EmailAddress) -> Result<(), LoginAttemptStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_normalised_email() {
        let email = EmailAddress::parse(" Client@Example.COM ").expect("valid email");
        assert_eq!(login_attempts_key(&email), "login_attempts_client@example.com");
    }
}
