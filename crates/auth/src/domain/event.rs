//! Security Events
//!
//! Structured events the core emits to an external sink: logins,
//! lockouts, password changes. Recording is fire-and-forget and
//! best-effort — the sink trait returns `()`, so a sink can never fail or
//! block an authentication flow outcome.

use chrono::{DateTime, Utc};
use derive_more::Display;

use crate::domain::value_object::UserId;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SecurityAction {
    #[display("registered")]
    Registered,
    #[display("login_success")]
    LoginSuccess,
    #[display("login_failure")]
    LoginFailure,
    #[display("account_locked")]
    AccountLocked,
    #[display("token_refreshed")]
    TokenRefreshed,
    #[display("password_changed")]
    PasswordChanged,
    #[display("logout")]
    Logout,
}

/// How serious it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Severity {
    #[display("info")]
    Info,
    #[display("warning")]
    Warning,
    #[display("critical")]
    Critical,
}

/// A structured security event
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    /// Acting account, when known (a failed login on an unknown email has
    /// no actor)
    pub actor_id: Option<UserId>,
    pub action: SecurityAction,
    pub severity: Severity,
    pub description: String,
    pub ip: Option<String>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(action: SecurityAction, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            action,
            severity,
            description: description.into(),
            ip: None,
            success: matches!(severity, Severity::Info),
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }
}

/// Sink for security events
///
/// Implementations must be quick and must swallow their own failures;
/// the core awaits `record` but has no error path to react to.
#[trait_variant::make(SecurityEventSink: Send)]
pub trait LocalSecurityEventSink {
    async fn record(&self, event: SecurityEvent);
}

/// Default sink: structured tracing output, severity mapped to level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl SecurityEventSink for TracingEventSink {
    async fn record(&self, event: SecurityEvent) {
        let actor = event
            .actor_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        match event.severity {
            Severity::Info => tracing::info!(
                actor = %actor,
                action = %event.action,
                ip = ?event.ip,
                success = event.success,
                "{}", event.description
            ),
            Severity::Warning => tracing::warn!(
                actor = %actor,
                action = %event.action,
                ip = ?event.ip,
                success = event.success,
                "{}", event.description
            ),
            Severity::Critical => tracing::error!(
                actor = %actor,
                action = %event.action,
                ip = ?event.ip,
                success = event.success,
                "{}", event.description
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let event = SecurityEvent::new(
            SecurityAction::LoginFailure,
            Severity::Warning,
            "wrong password",
        );
        assert!(event.actor_id.is_none());
        assert!(event.ip.is_none());
        // Non-info events default to unsuccessful
        assert!(!event.success);

        let event = event
            .with_actor(UserId::new())
            .with_ip(Some("203.0.113.9".to_string()));
        assert!(event.actor_id.is_some());
        assert_eq!(event.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(SecurityAction::AccountLocked.to_string(), "account_locked");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }
}
