//! Change Password Use Case
//!
//! Re-authenticates with the current password, strength-checks the new
//! one, rehashes, and clears the refresh-token slot so existing refresh
//! tokens stop working. `password_changed_at` is stamped for the owner's
//! policy decisions; it invalidates nothing by itself.

use std::sync::Arc;

use platform::password::{ClearTextPassword, PasswordHasher};

use crate::application::config::SecurityConfig;
use crate::domain::event::{SecurityAction, SecurityEvent, SecurityEventSink, Severity};
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Change password input
pub struct ChangePasswordInput {
    pub user_id: UserId,
    pub current_password: String,
    pub new_password: String,
    pub ip: Option<String>,
}

/// Change password use case
pub struct ChangePasswordUseCase<R, E>
where
    R: CredentialRepository,
    E: SecurityEventSink,
{
    repo: Arc<R>,
    events: Arc<E>,
    hasher: PasswordHasher,
}

impl<R, E> ChangePasswordUseCase<R, E>
where
    R: CredentialRepository,
    E: SecurityEventSink,
{
    pub fn new(repo: Arc<R>, events: Arc<E>, config: Arc<SecurityConfig>) -> Self {
        Self {
            repo,
            events,
            hasher: config.hasher(),
        }
    }

    pub async fn execute(&self, input: ChangePasswordInput) -> AuthResult<()> {
        let Some(mut credential) = self.repo.find_by_id(&input.user_id).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.is_active {
            return Err(AuthError::AccountInactive);
        }

        let current = ClearTextPassword::new(input.current_password);
        let hasher = self.hasher;
        let stored = credential.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&current, &stored))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !verified {
            self.events
                .record(
                    SecurityEvent::new(
                        SecurityAction::PasswordChanged,
                        Severity::Warning,
                        "Password change rejected: wrong current password",
                    )
                    .with_actor(credential.user_id)
                    .with_ip(input.ip.clone()),
                )
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        let new_password = ClearTextPassword::new(input.new_password);
        let report = new_password.strength();
        if !report.is_valid() {
            return Err(AuthError::WeakPassword {
                violations: report.violations,
            });
        }

        let hasher = self.hasher;
        let new_hash = tokio::task::spawn_blocking(move || hasher.hash(&new_password))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        credential.update_password(new_hash);
        // Force re-authentication on all devices holding the old pair
        credential.clear_refresh_token();
        self.repo.update(&credential).await?;

        self.events
            .record(
                SecurityEvent::new(
                    SecurityAction::PasswordChanged,
                    Severity::Info,
                    "Password changed",
                )
                .with_actor(credential.user_id)
                .with_ip(input.ip.clone()),
            )
            .await;

        tracing::info!(user_id = %credential.user_id, "Password changed");

        Ok(())
    }
}
