//! In-Memory Credential Store
//!
//! Reference implementation of the credential repository for
//! single-process embedders and tests. A locked `HashMap` serializes the
//! read-modify-write of the failure counter, which the repository
//! contract requires of every store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::entity::credential::Credential;
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{Email, UserId};
use crate::error::{AuthError, AuthResult};

/// In-memory credential store
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: Mutex<HashMap<UserId, Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Credential>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CredentialRepository for InMemoryCredentialStore {
    async fn create(&self, credential: &Credential) -> AuthResult<()> {
        let mut records = self.lock();
        if records.values().any(|c| c.email == credential.email) {
            return Err(AuthError::EmailTaken);
        }
        if records.contains_key(&credential.user_id) {
            return Err(AuthError::Storage("duplicate user id".to_string()));
        }
        records.insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<Credential>> {
        Ok(self.lock().get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Credential>> {
        Ok(self.lock().values().find(|c| &c.email == email).cloned())
    }

    async fn find_by_refresh_token_hash(&self, hash: &str) -> AuthResult<Option<Credential>> {
        Ok(self
            .lock()
            .values()
            .find(|c| c.refresh_token_hash.as_deref() == Some(hash))
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.lock().values().any(|c| &c.email == email))
    }

    async fn update(&self, credential: &Credential) -> AuthResult<()> {
        let mut records = self.lock();
        match records.get_mut(&credential.user_id) {
            Some(slot) => {
                *slot = credential.clone();
                Ok(())
            }
            None => Err(AuthError::Storage("credential not found".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::UserRole;
    use platform::password::HashedPassword;

    fn credential(email: &str) -> Credential {
        Credential::new(
            Email::new(email).unwrap(),
            UserRole::Customer,
            HashedPassword::from_encoded("aa:bb"),
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = InMemoryCredentialStore::new();
        let cred = credential("buyer@example.com");
        store.create(&cred).await.unwrap();

        let by_id = store.find_by_id(&cred.user_id).await.unwrap().unwrap();
        assert_eq!(by_id.email, cred.email);

        let by_email = store
            .find_by_email(&Email::new("buyer@example.com").unwrap())
            .await
            .unwrap();
        assert!(by_email.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryCredentialStore::new();
        store.create(&credential("buyer@example.com")).await.unwrap();

        let result = store.create(&credential("buyer@example.com")).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_find_by_refresh_token_hash() {
        let store = InMemoryCredentialStore::new();
        let mut cred = credential("buyer@example.com");
        cred.set_refresh_token("deadbeef".to_string());
        store.create(&cred).await.unwrap();

        let found = store.find_by_refresh_token_hash("deadbeef").await.unwrap();
        assert!(found.is_some());
        let missing = store.find_by_refresh_token_hash("cafebabe").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_fails() {
        let store = InMemoryCredentialStore::new();
        let result = store.update(&credential("ghost@example.com")).await;
        assert!(matches!(result, Err(AuthError::Storage(_))));
    }
}
