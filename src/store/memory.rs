//! In-process credential store.

use super::{
    CredentialStore, InsertOutcome, NewUser, StoreFuture, UserFilter, UserPatch, UserRecord,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Records keyed by email. Each operation holds the lock for its whole
/// read-modify-write, which gives the per-record atomicity the protocol needs.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_one<'a>(&'a self, filter: &'a UserFilter) -> StoreFuture<'a, Option<UserRecord>> {
        Box::pin(async move {
            let users = self.users.read().await;
            let found = match filter {
                UserFilter::Email(email) => users.get(email).cloned(),
                UserFilter::RefreshToken(_) => {
                    users.values().find(|record| filter.matches(record)).cloned()
                }
            };
            Ok(found)
        })
    }

    fn insert<'a>(&'a self, user: &'a NewUser) -> StoreFuture<'a, InsertOutcome> {
        Box::pin(async move {
            let mut users = self.users.write().await;
            if users.contains_key(&user.email) {
                return Ok(InsertOutcome::Conflict);
            }
            users.insert(user.email.clone(), UserRecord::from(user.clone()));
            Ok(InsertOutcome::Created)
        })
    }

    fn update_one<'a>(
        &'a self,
        filter: &'a UserFilter,
        patch: &'a UserPatch,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut users = self.users.write().await;
            let Some(record) = users.values_mut().find(|record| filter.matches(record)) else {
                return Ok(false);
            };
            record.refresh_token.clone_from(&patch.refresh_token);
            Ok(true)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            full_name: "Grace Hopper".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone_number: "555-0100".to_string(),
            email: email.to_string(),
            password_hash: "$2b$10$hash".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let user = new_user("grace@example.com");

        assert_eq!(store.insert(&user).await?, InsertOutcome::Created);
        assert_eq!(store.insert(&user).await?, InsertOutcome::Conflict);
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_sets_and_clears_refresh_token() -> Result<()> {
        let store = MemoryCredentialStore::new();
        store.insert(&new_user("grace@example.com")).await?;

        let by_email = UserFilter::Email("grace@example.com".to_string());
        assert!(
            store
                .update_one(&by_email, &UserPatch::set_refresh_token("token-a"))
                .await?
        );

        let by_token = UserFilter::RefreshToken("token-a".to_string());
        let record = store
            .find_one(&by_token)
            .await?
            .context("record should be found by refresh token")?;
        assert_eq!(record.email, "grace@example.com");

        assert!(
            store
                .update_one(&by_token, &UserPatch::clear_refresh_token())
                .await?
        );
        assert!(store.find_one(&by_token).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_without_match_reports_false() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let filter = UserFilter::RefreshToken("nobody".to_string());
        assert!(
            !store
                .update_one(&filter, &UserPatch::clear_refresh_token())
                .await?
        );
        assert!(store.is_empty().await);
        Ok(())
    }
}
