//! # Sesi (session authentication backend)
//!
//! `sesi` registers accounts with bcrypt-hashed passwords and runs a
//! two-token session protocol on top of them.
//!
//! ## Tokens
//!
//! - **Access token:** short lived HS256 JWT returned in the login and refresh
//!   JSON bodies.
//! - **Refresh token:** HS256 JWT signed with a separate secret, delivered in
//!   the `REFRESH_TOKEN` cookie and persisted on the user record.
//!
//! Each account holds at most one refresh token. A new login overwrites it, so
//! earlier refresh tokens stop working as soon as their record no longer
//! carries them. Logout clears the stored token.
//!
//! ## Storage
//!
//! Accounts live behind [`store::CredentialStore`], implemented for Postgres
//! and for an in-process map used by tests and `memory://` development runs.

pub mod api;
pub mod cli;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
