//! Auth Error Types
//!
//! The error taxonomy exposed by the security core. Wrong password,
//! unknown email and malformed identifiers all collapse to
//! [`AuthError::InvalidCredentials`]; token failures of every kind
//! collapse to [`AuthError::InvalidToken`]. Callers map these onto their
//! transport (HTTP status codes etc.) — that mapping is out of scope here.

use platform::password::PasswordPolicyError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown account. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is locked (too many failed attempts)
    #[error("Account is temporarily locked")]
    AccountLocked,

    /// Account is deactivated
    #[error("Account is disabled")]
    AccountInactive,

    /// Malformed, wrong-type, bad-signature or expired token.
    /// Collapsed to one outcome to avoid oracle leakage.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Password failed the strength policy; carries every violated rule
    #[error("Password does not meet the security requirements")]
    WeakPassword { violations: Vec<PasswordPolicyError> },

    /// Too many requests for the caller's rate-limit key
    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Email address failed validation
    #[error("Invalid email address")]
    InvalidEmail,

    /// Email address is already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether the caller may retry the same request after waiting
    ///
    /// Rate-limit and lock windows pass; weak passwords and invalid
    /// tokens do not become valid by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::RateLimited { .. } | AuthError::AccountLocked
        )
    }

    /// The violated strength rules, if this is a `WeakPassword` error
    pub fn policy_violations(&self) -> Option<&[PasswordPolicyError]> {
        match self {
            AuthError::WeakPassword { violations } => Some(violations),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AuthError::RateLimited { retry_after_secs: 30 }.is_retryable());
        assert!(AuthError::AccountLocked.is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
        assert!(!AuthError::InvalidToken.is_retryable());
        assert!(
            !AuthError::WeakPassword { violations: vec![] }.is_retryable()
        );
    }

    #[test]
    fn test_generic_credentials_message() {
        // Unknown user and wrong password must be indistinguishable
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }
}
