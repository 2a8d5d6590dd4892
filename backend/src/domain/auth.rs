//! Authentication primitives such as login credentials and lockout policy.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::time::Duration;

use zeroize::Zeroizing;

use crate::domain::{EmailAddress, UserValidationError};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    #[error("{0}")]
    Email(UserValidationError),
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed and lower-cased.
/// - `password` is non-empty and retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use portal::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "s3cret").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::parse(email).map_err(LoginValidationError::Email)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email suitable for account lookups.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Failed-attempt threshold and counting window for account lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Attempts tolerated inside one window; the next failure locks.
    pub max_attempts: u32,
    /// Window length; counters expire with it.
    pub window: Duration,
}

impl LockoutPolicy {
    /// Whether `attempts` failures within the window exceed the threshold.
    pub fn is_exceeded(&self, attempts: u32) -> bool {
        attempts > self.max_attempts
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw")]
    #[case("   ", "pw")]
    #[case("not-an-email", "pw")]
    fn invalid_email_is_rejected(#[case] email: &str, #[case] password: &str) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert!(matches!(err, LoginValidationError::Email(_)));
    }

    #[rstest]
    fn empty_password_is_rejected() {
        let err = LoginCredentials::try_from_parts("a@b.example", "")
            .expect_err("empty password must fail");
        assert_eq!(err, LoginValidationError::EmptyPassword);
    }

    #[rstest]
    #[case(" Ada@Example.com ", " keep spaces ")]
    #[case("bob@example.com", "correct horse battery staple")]
    fn valid_credentials_normalise_email(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email().as_ref(), email.trim().to_lowercase());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    #[case(5, false)]
    #[case(6, true)]
    fn default_policy_locks_after_five_failures(#[case] attempts: u32, #[case] locked: bool) {
        assert_eq!(LockoutPolicy::default().is_exceeded(attempts), locked);
    }
}
