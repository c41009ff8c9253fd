//! Logout Use Case
//!
//! Clears the refresh-token slot. Access tokens keep working until they
//! expire (no server-side revocation state for them); refresh is revoked
//! immediately. Idempotent: logging out an unknown or already-logged-out
//! account is a no-op.

use std::sync::Arc;

use crate::domain::event::{SecurityAction, SecurityEvent, SecurityEventSink, Severity};
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::UserId;
use crate::error::AuthResult;

/// Logout input
pub struct LogoutInput {
    pub user_id: UserId,
    pub ip: Option<String>,
}

/// Logout use case
pub struct LogoutUseCase<R, E>
where
    R: CredentialRepository,
    E: SecurityEventSink,
{
    repo: Arc<R>,
    events: Arc<E>,
}

impl<R, E> LogoutUseCase<R, E>
where
    R: CredentialRepository,
    E: SecurityEventSink,
{
    pub fn new(repo: Arc<R>, events: Arc<E>) -> Self {
        Self { repo, events }
    }

    pub async fn execute(&self, input: LogoutInput) -> AuthResult<()> {
        let Some(mut credential) = self.repo.find_by_id(&input.user_id).await? else {
            return Ok(());
        };

        credential.clear_refresh_token();
        self.repo.update(&credential).await?;

        self.events
            .record(
                SecurityEvent::new(SecurityAction::Logout, Severity::Info, "User logged out")
                    .with_actor(credential.user_id)
                    .with_ip(input.ip.clone()),
            )
            .await;

        tracing::debug!(user_id = %credential.user_id, "User logged out");

        Ok(())
    }
}
