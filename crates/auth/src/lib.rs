//! Auth (Credential & Session Security) Module
//!
//! The security core of the order-management backend. HTTP transport,
//! order/product domains and durable persistence live outside this crate;
//! it exposes a library boundary consumed by an authentication controller.
//!
//! Clean Architecture structure:
//! - `domain/` - Credential entity, value objects, repository trait, events
//! - `application/` - Use cases and configuration surface
//! - `infra/` - In-memory repository implementation
//! - `token` - Stateless token issue/verify service
//!
//! ## Security Model
//! - Passwords hashed with salted PBKDF2-HMAC-SHA512, verified in
//!   constant time
//! - Self-contained HMAC-SHA256 token pairs; access and refresh tokens
//!   signed with independent secrets
//! - Refresh tokens stored only as SHA-256 hashes, one slot per account
//! - Automatic temporary lockout after consecutive failed logins,
//!   lazily expired
//! - Login pipeline ordered cheap-to-expensive: rate limit → lockout →
//!   KDF verify → token issue

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod token;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::SecurityConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::InMemoryCredentialStore;
pub use token::{TokenClaims, TokenConfig, TokenPair, TokenService, TokenType};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}

pub mod events {
    pub use crate::domain::event::*;
}
