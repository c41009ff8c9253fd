//! Login Use Case
//!
//! Authenticates a credential and issues a token pair.
//!
//! The pipeline is strictly ordered, each step a cheaper gate ahead of a
//! more expensive one: rate limit → load → active → lockout → password
//! verify → token issue. The lockout check runs *before* verification so
//! a locked account never spends KDF work, and unknown email / wrong
//! password / malformed email all collapse to `InvalidCredentials`.

use std::sync::Arc;

use platform::password::{ClearTextPassword, PasswordHasher};
use platform::rate_limit::RateLimitStore;

use crate::application::config::SecurityConfig;
use crate::domain::event::{SecurityAction, SecurityEvent, SecurityEventSink, Severity};
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{Email, UserId};
use crate::error::{AuthError, AuthResult};
use crate::token::TokenService;

/// Login input
pub struct LoginInput {
    /// Login identifier
    pub email: String,
    /// Candidate password
    pub password: String,
    /// Opaque rate-limit key built by the caller (e.g. `clientIp:/auth/login`);
    /// the core never derives keys itself
    pub rate_limit_key: String,
    /// Client address for audit events
    pub ip: Option<String>,
}

/// Login output
pub struct LoginOutput {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_secs: u64,
}

/// Login use case
pub struct LoginUseCase<R, L, E>
where
    R: CredentialRepository,
    L: RateLimitStore,
    E: SecurityEventSink,
{
    repo: Arc<R>,
    limiter: Arc<L>,
    events: Arc<E>,
    config: Arc<SecurityConfig>,
    token_service: TokenService,
    hasher: PasswordHasher,
}

impl<R, L, E> LoginUseCase<R, L, E>
where
    R: CredentialRepository,
    L: RateLimitStore,
    E: SecurityEventSink,
{
    pub fn new(repo: Arc<R>, limiter: Arc<L>, events: Arc<E>, config: Arc<SecurityConfig>) -> Self {
        let token_service = TokenService::new(config.token_config());
        let hasher = config.hasher();
        Self {
            repo,
            limiter,
            events,
            config,
            token_service,
            hasher,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        // Rate limit before touching storage
        let decision = self
            .limiter
            .check_and_increment(&input.rate_limit_key, &self.config.login_rate_limit)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !decision.allowed {
            let retry_after_secs = decision.retry_after_secs.unwrap_or(0);
            self.events
                .record(
                    SecurityEvent::new(
                        SecurityAction::LoginFailure,
                        Severity::Warning,
                        "Login rate limit exceeded",
                    )
                    .with_ip(input.ip.clone()),
                )
                .await;
            return Err(AuthError::RateLimited { retry_after_secs });
        }

        // A malformed identifier is indistinguishable from a wrong one
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(mut credential) = self.repo.find_by_email(&email).await? else {
            self.events
                .record(
                    SecurityEvent::new(
                        SecurityAction::LoginFailure,
                        Severity::Warning,
                        "Login attempt for unknown email",
                    )
                    .with_ip(input.ip.clone()),
                )
                .await;
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.is_active {
            self.events
                .record(
                    SecurityEvent::new(
                        SecurityAction::LoginFailure,
                        Severity::Warning,
                        "Login attempt on disabled account",
                    )
                    .with_actor(credential.user_id)
                    .with_ip(input.ip.clone()),
                )
                .await;
            return Err(AuthError::AccountInactive);
        }

        // Lockout gate runs before any KDF work
        if credential.is_locked() {
            self.events
                .record(
                    SecurityEvent::new(
                        SecurityAction::LoginFailure,
                        Severity::Warning,
                        "Login attempt on locked account",
                    )
                    .with_actor(credential.user_id)
                    .with_ip(input.ip.clone()),
                )
                .await;
            return Err(AuthError::AccountLocked);
        }

        // Deliberately slow derivation, off the async runtime
        let password = ClearTextPassword::new(input.password);
        let hasher = self.hasher;
        let stored = credential.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !verified {
            let locked_now = credential.record_failed_login(&self.config.lockout);
            self.repo.update(&credential).await?;

            if locked_now {
                self.events
                    .record(
                        SecurityEvent::new(
                            SecurityAction::AccountLocked,
                            Severity::Critical,
                            format!(
                                "Account locked after {} consecutive failed logins",
                                credential.failed_login_attempts
                            ),
                        )
                        .with_actor(credential.user_id)
                        .with_ip(input.ip.clone()),
                    )
                    .await;
            } else {
                self.events
                    .record(
                        SecurityEvent::new(
                            SecurityAction::LoginFailure,
                            Severity::Warning,
                            "Failed login attempt",
                        )
                        .with_actor(credential.user_id)
                        .with_ip(input.ip.clone()),
                    )
                    .await;
            }
            return Err(AuthError::InvalidCredentials);
        }

        // Success: reset security state, issue pair, persist refresh hash
        credential.record_successful_login(input.ip.clone());
        let pair = self.token_service.generate_token_pair(
            credential.user_id,
            &credential.email,
            credential.role,
        );
        credential.set_refresh_token(self.token_service.hash_token(&pair.refresh_token));
        self.repo.update(&credential).await?;

        self.events
            .record(
                SecurityEvent::new(
                    SecurityAction::LoginSuccess,
                    Severity::Info,
                    "User logged in",
                )
                .with_actor(credential.user_id)
                .with_ip(input.ip.clone()),
            )
            .await;

        tracing::info!(user_id = %credential.user_id, "User logged in");

        Ok(LoginOutput {
            user_id: credential.user_id,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in_secs: pair.expires_in_secs,
        })
    }
}
