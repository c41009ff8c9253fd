//! Repository Traits
//!
//! Interface for the credential store. Implementation is owned by the
//! caller's persistence layer; `infra::memory` ships a single-process
//! reference implementation.
//!
//! Read-modify-write of the failure counter must be serialized by the
//! implementing store (atomic update or row lock) — the core itself does
//! not lock.

use crate::domain::entity::credential::Credential;
use crate::domain::value_object::{Email, UserId};
use crate::error::AuthResult;

/// Credential repository trait
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    /// Create a new credential record
    async fn create(&self, credential: &Credential) -> AuthResult<()>;

    /// Find a credential by user ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<Credential>>;

    /// Find a credential by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Credential>>;

    /// Find the credential holding a given refresh-token hash
    async fn find_by_refresh_token_hash(&self, hash: &str) -> AuthResult<Option<Credential>>;

    /// Check if an email is already registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Update a credential record
    async fn update(&self, credential: &Credential) -> AuthResult<()>;
}
