//! Credential Entity
//!
//! The per-account security record: password hash, consecutive-failure
//! counter, temporary lock and the single refresh-token slot.
//! Separated from any profile/order data to isolate sensitive state.
//!
//! Lock state is lazily evaluated from `locked_until` on every check —
//! there is no background job that unlocks accounts.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{Email, UserId, UserRole};
use platform::password::HashedPassword;

/// Lockout policy: when and for how long an account locks
///
/// The lock is a deterministic consequence of the failure counter
/// crossing the threshold, applied inside
/// [`Credential::record_failed_login`], never a separate caller decision.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock
    pub max_failed_attempts: u16,
    /// How long the lock lasts
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lock_duration: Duration::minutes(30),
        }
    }
}

/// Credential record entity
#[derive(Debug, Clone)]
pub struct Credential {
    /// Stable account identifier
    pub user_id: UserId,
    /// Login identifier
    pub email: Email,
    /// Role carried into issued tokens
    pub role: UserRole,
    /// Stored password hash (`salt:hash` encoding)
    pub password_hash: HashedPassword,
    /// Deactivated accounts cannot log in regardless of lock state
    pub is_active: bool,
    /// Consecutive failed login attempts
    pub failed_login_attempts: u16,
    /// Account locked until (temporary lockout after failures)
    pub locked_until: Option<DateTime<Utc>>,
    /// SHA-256 hex of the currently valid refresh token; absent once
    /// logged out or rotated
    pub refresh_token_hash: Option<String>,
    /// Updated on every password change; exposed for policy decisions,
    /// invalidates nothing by itself
    pub password_changed_at: DateTime<Utc>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Last successful login source
    pub last_login_ip: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a new credential record
    pub fn new(email: Email, role: UserRole, password_hash: HashedPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            role,
            password_hash,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            refresh_token_hash: None,
            password_changed_at: now,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account is currently locked
    pub fn is_locked(&self) -> bool {
        if let Some(locked_until) = self.locked_until {
            Utc::now() < locked_until
        } else {
            false
        }
    }

    /// Check if the account is usable for login: active and not locked
    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_locked()
    }

    /// Record a failed login attempt
    ///
    /// Increments the counter and, once it reaches the policy threshold,
    /// sets `locked_until` in the same operation. Returns `true` when this
    /// call locked the account.
    pub fn record_failed_login(&mut self, policy: &LockoutPolicy) -> bool {
        let now = Utc::now();
        self.failed_login_attempts += 1;
        self.updated_at = now;

        if self.failed_login_attempts >= policy.max_failed_attempts {
            self.locked_until = Some(now + policy.lock_duration);
            return true;
        }
        false
    }

    /// Record a successful login
    ///
    /// Resets the failure counter and clears any lock, regardless of
    /// prior state.
    pub fn record_successful_login(&mut self, ip: Option<String>) {
        let now = Utc::now();
        self.failed_login_attempts = 0;
        self.locked_until = None;
        self.last_login_at = Some(now);
        self.last_login_ip = ip;
        self.updated_at = now;
    }

    /// Store the hash of the currently valid refresh token
    ///
    /// Single slot: issuing a new pair implicitly invalidates any prior
    /// refresh token.
    pub fn set_refresh_token(&mut self, hash: String) {
        self.refresh_token_hash = Some(hash);
        self.updated_at = Utc::now();
    }

    /// Clear the refresh-token slot (logout / rotation / password change)
    pub fn clear_refresh_token(&mut self) {
        self.refresh_token_hash = None;
        self.updated_at = Utc::now();
    }

    /// Replace the password hash, stamping `password_changed_at`
    pub fn update_password(&mut self, new_hash: HashedPassword) {
        let now = Utc::now();
        self.password_hash = new_hash;
        self.password_changed_at = now;
        self.updated_at = now;
    }
}
