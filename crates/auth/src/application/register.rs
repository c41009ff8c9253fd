//! Register Use Case
//!
//! Creates a new credential record. Unlike login, validation errors here
//! are surfaced in full: the strength report carries every violated rule
//! so the caller can display the complete list.

use std::sync::Arc;

use platform::password::ClearTextPassword;
use platform::rate_limit::RateLimitStore;

use crate::application::config::SecurityConfig;
use crate::domain::entity::credential::Credential;
use crate::domain::event::{SecurityAction, SecurityEvent, SecurityEventSink, Severity};
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{Email, UserId, UserRole};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    /// Opaque rate-limit key built by the caller
    pub rate_limit_key: String,
    pub ip: Option<String>,
}

/// Register output
#[derive(Debug)]
pub struct RegisterOutput {
    pub user_id: UserId,
}

/// Register use case
pub struct RegisterUseCase<R, L, E>
where
    R: CredentialRepository,
    L: RateLimitStore,
    E: SecurityEventSink,
{
    repo: Arc<R>,
    limiter: Arc<L>,
    events: Arc<E>,
    config: Arc<SecurityConfig>,
}

impl<R, L, E> RegisterUseCase<R, L, E>
where
    R: CredentialRepository,
    L: RateLimitStore,
    E: SecurityEventSink,
{
    pub fn new(repo: Arc<R>, limiter: Arc<L>, events: Arc<E>, config: Arc<SecurityConfig>) -> Self {
        Self {
            repo,
            limiter,
            events,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        // Registration runs under the general limit, not the login limit
        let decision = self
            .limiter
            .check_and_increment(&input.rate_limit_key, &self.config.rate_limit_default)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !decision.allowed {
            return Err(AuthError::RateLimited {
                retry_after_secs: decision.retry_after_secs.unwrap_or(0),
            });
        }

        let email = Email::new(&input.email)?;

        if self.repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password = ClearTextPassword::new(input.password);
        let report = password.strength();
        if !report.is_valid() {
            return Err(AuthError::WeakPassword {
                violations: report.violations,
            });
        }

        // KDF work off the async runtime
        let hasher = self.config.hasher();
        let password_hash =
            tokio::task::spawn_blocking(move || hasher.hash(&password))
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?;

        let credential = Credential::new(email, input.role, password_hash);
        self.repo.create(&credential).await?;

        self.events
            .record(
                SecurityEvent::new(
                    SecurityAction::Registered,
                    Severity::Info,
                    "Account registered",
                )
                .with_actor(credential.user_id)
                .with_ip(input.ip.clone()),
            )
            .await;

        tracing::info!(user_id = %credential.user_id, "Account registered");

        Ok(RegisterOutput {
            user_id: credential.user_id,
        })
    }
}
