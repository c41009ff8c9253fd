//! Application Configuration
//!
//! The construction-time configuration surface of the security core.
//! Secrets are explicit fields handed in by the embedder — there is no
//! ambient/environment lookup in this crate, and no runtime rotation.

use std::fmt;
use std::time::Duration;

use platform::password::{DEFAULT_KDF_ITERATIONS, PasswordHasher};
use platform::rate_limit::RateLimitConfig;

use crate::domain::entity::credential::LockoutPolicy;
use crate::token::TokenConfig;

/// Security core configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// HMAC secret for access tokens
    pub access_token_secret: Vec<u8>,
    /// HMAC secret for refresh tokens (independent of the access secret)
    pub refresh_token_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (7 days)
    pub refresh_token_ttl: Duration,
    /// PBKDF2 iteration count
    pub kdf_iterations: u32,
    /// Process-wide rate limit default
    pub rate_limit_default: RateLimitConfig,
    /// Stricter limit applied to login attempts
    pub login_rate_limit: RateLimitConfig,
    /// Failure threshold and lock duration
    pub lockout: LockoutPolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_token_secret: vec![0u8; 32],
            refresh_token_secret: vec![0u8; 32],
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            rate_limit_default: RateLimitConfig::default(),
            login_rate_limit: RateLimitConfig::new(5, 15 * 60),
            lockout: LockoutPolicy::default(),
        }
    }
}

impl SecurityConfig {
    /// Create a config with random token secrets (for development/tests)
    pub fn with_random_secrets() -> Self {
        use rand::RngCore;
        let mut access = vec![0u8; 32];
        let mut refresh = vec![0u8; 32];
        rand::rng().fill_bytes(&mut access);
        rand::rng().fill_bytes(&mut refresh);
        Self {
            access_token_secret: access,
            refresh_token_secret: refresh,
            ..Default::default()
        }
    }

    /// Password hasher configured with this config's iteration count
    pub fn hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.kdf_iterations)
    }

    /// Token service configuration derived from this config
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.access_token_secret.clone(),
            refresh_secret: self.refresh_token_secret.clone(),
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("access_token_secret", &"[SECRET]")
            .field("refresh_token_secret", &"[SECRET]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("kdf_iterations", &self.kdf_iterations)
            .field("rate_limit_default", &self.rate_limit_default)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("lockout", &self.lockout)
            .finish()
    }
}
