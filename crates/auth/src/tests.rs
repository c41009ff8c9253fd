//! End-to-end scenarios for the security core
//!
//! Exercises the full register → login → refresh → logout pipeline
//! against the in-memory store, a real fixed-window limiter and a
//! capturing event sink.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use platform::password::PasswordPolicyError;
use platform::rate_limit::{FixedWindowLimiter, RateLimitConfig};

use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, LoginInput, LoginUseCase, LogoutInput,
    LogoutUseCase, RefreshTokenInput, RefreshTokenUseCase, RegisterInput, RegisterUseCase,
    SecurityConfig,
};
use crate::domain::event::{SecurityAction, SecurityEvent, SecurityEventSink, Severity};
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{UserId, UserRole};
use crate::error::AuthError;
use crate::infra::memory::InMemoryCredentialStore;
use crate::token::TokenService;

const GOOD_PASSWORD: &str = "Br1ght&Orange#Cat";
const OTHER_PASSWORD: &str = "Sturdy^Copper9Fox";

/// Sink that stores every event for later assertions
#[derive(Default)]
struct CapturingSink {
    events: Mutex<Vec<SecurityEvent>>,
}

impl CapturingSink {
    fn recorded(&self) -> Vec<SecurityEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SecurityEventSink for CapturingSink {
    async fn record(&self, event: SecurityEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct World {
    store: Arc<InMemoryCredentialStore>,
    limiter: Arc<FixedWindowLimiter>,
    sink: Arc<CapturingSink>,
    config: Arc<SecurityConfig>,
}

impl World {
    fn new(config: SecurityConfig) -> Self {
        let rate_limit_default = config.rate_limit_default.clone();
        Self {
            store: Arc::new(InMemoryCredentialStore::new()),
            limiter: Arc::new(FixedWindowLimiter::new(rate_limit_default)),
            sink: Arc::new(CapturingSink::default()),
            config: Arc::new(config),
        }
    }

    fn login_use_case(
        &self,
    ) -> LoginUseCase<InMemoryCredentialStore, FixedWindowLimiter, CapturingSink> {
        LoginUseCase::new(
            self.store.clone(),
            self.limiter.clone(),
            self.sink.clone(),
            self.config.clone(),
        )
    }

    fn register_use_case(
        &self,
    ) -> RegisterUseCase<InMemoryCredentialStore, FixedWindowLimiter, CapturingSink> {
        RegisterUseCase::new(
            self.store.clone(),
            self.limiter.clone(),
            self.sink.clone(),
            self.config.clone(),
        )
    }

    fn refresh_use_case(&self) -> RefreshTokenUseCase<InMemoryCredentialStore, CapturingSink> {
        RefreshTokenUseCase::new(self.store.clone(), self.sink.clone(), self.config.clone())
    }

    fn logout_use_case(&self) -> LogoutUseCase<InMemoryCredentialStore, CapturingSink> {
        LogoutUseCase::new(self.store.clone(), self.sink.clone())
    }

    fn change_password_use_case(
        &self,
    ) -> ChangePasswordUseCase<InMemoryCredentialStore, CapturingSink> {
        ChangePasswordUseCase::new(self.store.clone(), self.sink.clone(), self.config.clone())
    }

    fn token_service(&self) -> TokenService {
        TokenService::new(self.config.token_config())
    }

    async fn register(&self, email: &str, password: &str) -> UserId {
        self.register_use_case()
            .execute(RegisterInput {
                email: email.to_string(),
                password: password.to_string(),
                role: UserRole::Customer,
                rate_limit_key: format!("test:{email}:/auth/register"),
                ip: Some("203.0.113.9".to_string()),
            })
            .await
            .expect("registration should succeed")
            .user_id
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        self.login_use_case()
            .execute(login_input(email, password))
            .await
            .map(|out| out.user_id)
    }
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_string(),
        password: password.to_string(),
        rate_limit_key: format!("test:{email}:/auth/login"),
        ip: Some("203.0.113.9".to_string()),
    }
}

/// Low iteration count keeps the KDF fast in tests
fn test_config() -> SecurityConfig {
    SecurityConfig {
        kdf_iterations: 1_000,
        ..SecurityConfig::with_random_secrets()
    }
}

#[tokio::test]
async fn test_register_then_login_issues_verifiable_pair() {
    let world = World::new(test_config());
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    let output = world
        .login_use_case()
        .execute(login_input("buyer@example.com", GOOD_PASSWORD))
        .await
        .unwrap();
    assert_eq!(output.user_id, user_id);
    assert_eq!(output.expires_in_secs, 15 * 60);

    let claims = world
        .token_service()
        .verify_access_token(&output.access_token)
        .unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email.as_str(), "buyer@example.com");
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let world = World::new(test_config());
    world.register("buyer@example.com", GOOD_PASSWORD).await;

    let unknown = world.try_login("ghost@example.com", GOOD_PASSWORD).await;
    let wrong = world.try_login("buyer@example.com", "Wr0ng!Password#").await;

    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    assert_eq!(
        unknown.unwrap_err().to_string(),
        wrong.unwrap_err().to_string()
    );
}

#[tokio::test]
async fn test_fifth_failure_locks_and_correct_password_stays_locked() {
    let world = World::new(test_config());
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    // First 4 wrong attempts: invalid credentials, account stays unlocked
    for attempt in 1u16..=4 {
        let result = world.try_login("buyer@example.com", "Wr0ng!Password#").await;
        assert!(
            matches!(result, Err(AuthError::InvalidCredentials)),
            "attempt {attempt}"
        );

        let stored = world.store.find_by_id(&user_id).await.unwrap().unwrap();
        assert!(!stored.is_locked(), "attempt {attempt} must not lock");
        assert_eq!(stored.failed_login_attempts, attempt);
    }

    // 5th wrong attempt: still invalid credentials, but now locked
    let result = world.try_login("buyer@example.com", "Wr0ng!Password#").await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    let stored = world.store.find_by_id(&user_id).await.unwrap().unwrap();
    assert!(stored.is_locked());

    // 6th attempt with the CORRECT password: rejected as locked
    let result = world.try_login("buyer@example.com", GOOD_PASSWORD).await;
    assert!(matches!(result, Err(AuthError::AccountLocked)));

    // The lockout escalated to a critical event
    let events = world.sink.recorded();
    assert!(events.iter().any(|e| {
        e.action == SecurityAction::AccountLocked
            && e.severity == Severity::Critical
            && e.actor_id == Some(user_id)
    }));
}

#[tokio::test]
async fn test_lock_expires_lazily_and_success_resets_counter() {
    let mut config = test_config();
    config.lockout.lock_duration = chrono::Duration::milliseconds(80);
    let world = World::new(config);
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    for _ in 0..5 {
        let _ = world.try_login("buyer@example.com", "Wr0ng!Password#").await;
    }
    assert!(matches!(
        world.try_login("buyer@example.com", GOOD_PASSWORD).await,
        Err(AuthError::AccountLocked)
    ));

    tokio::time::sleep(StdDuration::from_millis(100)).await;

    // No sweeper ran; the lock simply reads as expired now
    let user = world.try_login("buyer@example.com", GOOD_PASSWORD).await;
    assert_eq!(user.unwrap(), user_id);

    let stored = world.store.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.locked_until.is_none());
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_login_rate_limit_precedes_credential_check() {
    let mut config = test_config();
    config.login_rate_limit = RateLimitConfig::new(2, 60);
    let world = World::new(config);
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    let _ = world.try_login("buyer@example.com", "Wr0ng!Password#").await;
    let _ = world.try_login("buyer@example.com", "Wr0ng!Password#").await;

    // Third call is turned away before the password is ever checked
    let result = world.try_login("buyer@example.com", GOOD_PASSWORD).await;
    match result {
        Err(AuthError::RateLimited { retry_after_secs }) => {
            assert!(retry_after_secs > 0);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // The gated attempt never reached the failure counter
    let stored = world.store.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 2);
}

#[tokio::test]
async fn test_refresh_rotates_and_revokes_old_token() {
    let world = World::new(test_config());
    world.register("buyer@example.com", GOOD_PASSWORD).await;

    let login = world
        .login_use_case()
        .execute(login_input("buyer@example.com", GOOD_PASSWORD))
        .await
        .unwrap();

    let rotated = world
        .refresh_use_case()
        .execute(RefreshTokenInput {
            refresh_token: login.refresh_token.clone(),
            ip: None,
        })
        .await
        .unwrap();

    // New pair verifies
    assert!(
        world
            .token_service()
            .verify_access_token(&rotated.access_token)
            .is_some()
    );

    // The presented token was rotated out and cannot be replayed
    let replay = world
        .refresh_use_case()
        .execute(RefreshTokenInput {
            refresh_token: login.refresh_token,
            ip: None,
        })
        .await;
    assert!(matches!(replay, Err(AuthError::InvalidToken)));

    // The rotated token still works
    let again = world
        .refresh_use_case()
        .execute(RefreshTokenInput {
            refresh_token: rotated.refresh_token,
            ip: None,
        })
        .await;
    assert!(again.is_ok());
}

#[tokio::test]
async fn test_logout_revokes_refresh_but_not_access() {
    let world = World::new(test_config());
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    let login = world
        .login_use_case()
        .execute(login_input("buyer@example.com", GOOD_PASSWORD))
        .await
        .unwrap();

    world
        .logout_use_case()
        .execute(LogoutInput {
            user_id,
            ip: None,
        })
        .await
        .unwrap();

    let refresh = world
        .refresh_use_case()
        .execute(RefreshTokenInput {
            refresh_token: login.refresh_token,
            ip: None,
        })
        .await;
    assert!(matches!(refresh, Err(AuthError::InvalidToken)));

    // Access tokens are self-contained and keep working until expiry
    assert!(
        world
            .token_service()
            .verify_access_token(&login.access_token)
            .is_some()
    );

    // Logout is idempotent, also for unknown users
    assert!(
        world
            .logout_use_case()
            .execute(LogoutInput {
                user_id: UserId::new(),
                ip: None,
            })
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_change_password_rotates_credentials() {
    let world = World::new(test_config());
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    let login = world
        .login_use_case()
        .execute(login_input("buyer@example.com", GOOD_PASSWORD))
        .await
        .unwrap();

    // Wrong current password is rejected with the generic error
    let wrong = world
        .change_password_use_case()
        .execute(ChangePasswordInput {
            user_id,
            current_password: "Wr0ng!Password#".to_string(),
            new_password: OTHER_PASSWORD.to_string(),
            ip: None,
        })
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    // A weak replacement reports every violated rule
    let weak = world
        .change_password_use_case()
        .execute(ChangePasswordInput {
            user_id,
            current_password: GOOD_PASSWORD.to_string(),
            new_password: "short".to_string(),
            ip: None,
        })
        .await;
    match weak {
        Err(AuthError::WeakPassword { violations }) => {
            assert!(violations.len() >= 3);
            assert!(violations.contains(&PasswordPolicyError::MissingDigit));
        }
        other => panic!("expected WeakPassword, got {other:?}"),
    }

    world
        .change_password_use_case()
        .execute(ChangePasswordInput {
            user_id,
            current_password: GOOD_PASSWORD.to_string(),
            new_password: OTHER_PASSWORD.to_string(),
            ip: None,
        })
        .await
        .unwrap();

    // Old password no longer works, new one does
    assert!(matches!(
        world.try_login("buyer@example.com", GOOD_PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(world.try_login("buyer@example.com", OTHER_PASSWORD).await.is_ok());

    // The pre-change refresh token was cleared
    let refresh = world
        .refresh_use_case()
        .execute(RefreshTokenInput {
            refresh_token: login.refresh_token,
            ip: None,
        })
        .await;
    assert!(matches!(refresh, Err(AuthError::InvalidToken)));

    let stored = world.store.find_by_id(&user_id).await.unwrap().unwrap();
    assert!(stored.password_changed_at > stored.created_at);
}

#[tokio::test]
async fn test_register_rejects_weak_and_duplicate() {
    let world = World::new(test_config());

    let weak = world
        .register_use_case()
        .execute(RegisterInput {
            email: "buyer@example.com".to_string(),
            password: "password123ABC!".to_string(),
            role: UserRole::Customer,
            rate_limit_key: "test:register".to_string(),
            ip: None,
        })
        .await;
    match weak {
        Err(AuthError::WeakPassword { violations }) => {
            assert!(violations.contains(&PasswordPolicyError::WeakSubstring));
        }
        other => panic!("expected WeakPassword, got {other:?}"),
    }

    world.register("buyer@example.com", GOOD_PASSWORD).await;

    let duplicate = world
        .register_use_case()
        .execute(RegisterInput {
            email: "buyer@example.com".to_string(),
            password: OTHER_PASSWORD.to_string(),
            role: UserRole::Customer,
            rate_limit_key: "test:register".to_string(),
            ip: None,
        })
        .await;
    assert!(matches!(duplicate, Err(AuthError::EmailTaken)));
}

#[tokio::test]
async fn test_inactive_account_cannot_login() {
    let world = World::new(test_config());
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;

    let mut stored = world.store.find_by_id(&user_id).await.unwrap().unwrap();
    stored.is_active = false;
    world.store.update(&stored).await.unwrap();

    let result = world.try_login("buyer@example.com", GOOD_PASSWORD).await;
    assert!(matches!(result, Err(AuthError::AccountInactive)));
}

#[tokio::test]
async fn test_success_events_reach_the_sink() {
    let world = World::new(test_config());
    let user_id = world.register("buyer@example.com", GOOD_PASSWORD).await;
    world
        .try_login("buyer@example.com", GOOD_PASSWORD)
        .await
        .unwrap();

    let events = world.sink.recorded();
    assert!(events.iter().any(|e| e.action == SecurityAction::Registered));
    assert!(events.iter().any(|e| {
        e.action == SecurityAction::LoginSuccess
            && e.severity == Severity::Info
            && e.actor_id == Some(user_id)
            && e.ip.as_deref() == Some("203.0.113.9")
    }));
}
