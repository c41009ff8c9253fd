//! Refresh Token Use Case
//!
//! Exchanges a valid refresh token for a fresh pair, rotating the stored
//! hash so the presented token cannot be replayed. The token service
//! checks signature/type/expiry; this use case adds the stateful half:
//! the token's SHA-256 hash must match the credential's single slot.

use std::sync::Arc;

use platform::crypto::constant_time_eq;

use crate::application::config::SecurityConfig;
use crate::domain::event::{SecurityAction, SecurityEvent, SecurityEventSink, Severity};
use crate::domain::repository::CredentialRepository;
use crate::error::{AuthError, AuthResult};
use crate::token::TokenService;

/// Refresh input
pub struct RefreshTokenInput {
    pub refresh_token: String,
    pub ip: Option<String>,
}

/// Refresh output: a rotated pair
pub struct RefreshTokenOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_secs: u64,
}

/// Refresh token use case
pub struct RefreshTokenUseCase<R, E>
where
    R: CredentialRepository,
    E: SecurityEventSink,
{
    repo: Arc<R>,
    events: Arc<E>,
    token_service: TokenService,
}

impl<R, E> RefreshTokenUseCase<R, E>
where
    R: CredentialRepository,
    E: SecurityEventSink,
{
    pub fn new(repo: Arc<R>, events: Arc<E>, config: Arc<SecurityConfig>) -> Self {
        Self {
            repo,
            events,
            token_service: TokenService::new(config.token_config()),
        }
    }

    pub async fn execute(&self, input: RefreshTokenInput) -> AuthResult<RefreshTokenOutput> {
        // Stateless checks first: signature, type, expiry
        let claims = self
            .token_service
            .verify_refresh_token(&input.refresh_token)
            .ok_or(AuthError::InvalidToken)?;

        let Some(mut credential) = self.repo.find_by_id(&claims.sub).await? else {
            return Err(AuthError::InvalidToken);
        };

        if !credential.is_active {
            return Err(AuthError::AccountInactive);
        }
        if credential.is_locked() {
            return Err(AuthError::AccountLocked);
        }

        // The stored slot must hold this exact token's hash; a logged-out
        // or already-rotated token fails here
        let presented = self.token_service.hash_token(&input.refresh_token);
        let matches = credential
            .refresh_token_hash
            .as_ref()
            .is_some_and(|stored| constant_time_eq(stored.as_bytes(), presented.as_bytes()));
        if !matches {
            self.events
                .record(
                    SecurityEvent::new(
                        SecurityAction::TokenRefreshed,
                        Severity::Warning,
                        "Refresh attempt with a rotated or revoked token",
                    )
                    .with_actor(credential.user_id)
                    .with_ip(input.ip.clone()),
                )
                .await;
            return Err(AuthError::InvalidToken);
        }

        // Rotate: the old refresh token is implicitly invalidated
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
                    SecurityAction::TokenRefreshed,
                    Severity::Info,
                    "Token pair rotated",
                )
                .with_actor(credential.user_id)
                .with_ip(input.ip.clone()),
            )
            .await;

        tracing::debug!(user_id = %credential.user_id, "Token pair rotated");

        Ok(RefreshTokenOutput {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in_secs: pair.expires_in_secs,
        })
    }
}
