//! Credential store contract.
//!
//! The session protocol never talks to a database directly. It goes through
//! [`CredentialStore`], a narrow lookup/insert/update contract where every
//! filter is an exact match on either the email or the stored refresh token.
//!
//! Two implementations ship with the crate:
//!
//! - [`PgCredentialStore`] keeps user records in Postgres.
//! - [`MemoryCredentialStore`] keeps them in process memory (tests, local runs).

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin};
use thiserror::Error;

/// Boxed future returned by store operations so the store can live behind
/// `Arc<dyn CredentialStore>`.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A persisted user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password_hash: String,
    /// At most one live refresh token per user; `None` once logged out.
    pub refresh_token: Option<String>,
}

/// Fields required to create a user. New users never hold a refresh token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password_hash: String,
}

impl From<NewUser> for UserRecord {
    fn from(user: NewUser) -> Self {
        Self {
            full_name: user.full_name,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token: None,
        }
    }
}

/// Exact-match filters understood by every store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserFilter {
    Email(String),
    RefreshToken(String),
}

impl UserFilter {
    pub fn matches(&self, record: &UserRecord) -> bool {
        match self {
            Self::Email(email) => record.email == *email,
            Self::RefreshToken(token) => record.refresh_token.as_deref() == Some(token.as_str()),
        }
    }
}

/// The only mutable field is the refresh token: set on login, cleared on logout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPatch {
    pub refresh_token: Option<String>,
}

impl UserPatch {
    #[must_use]
    pub fn set_refresh_token(token: impl Into<String>) -> Self {
        Self {
            refresh_token: Some(token.into()),
        }
    }

    #[must_use]
    pub const fn clear_refresh_token() -> Self {
        Self {
            refresh_token: None,
        }
    }
}

/// Outcome of an insert; a duplicate email is not an error at this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    Conflict,
}

pub trait CredentialStore: Send + Sync {
    /// Return the first record matching `filter`, if any.
    fn find_one<'a>(&'a self, filter: &'a UserFilter) -> StoreFuture<'a, Option<UserRecord>>;

    /// Create a record. Reports [`InsertOutcome::Conflict`] when the email is taken.
    fn insert<'a>(&'a self, user: &'a NewUser) -> StoreFuture<'a, InsertOutcome>;

    /// Apply `patch` to the first record matching `filter`.
    /// Returns `false` when nothing matched.
    fn update_one<'a>(
        &'a self,
        filter: &'a UserFilter,
        patch: &'a UserPatch,
    ) -> StoreFuture<'a, bool>;

    /// Cheap liveness probe used by `/health`.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
