//! HTTP handlers for the session endpoints.
//!
//! Each handler extracts its input (JSON body or `REFRESH_TOKEN` cookie),
//! delegates to [`crate::session::SessionProtocol`] and maps the outcome to a
//! status code.

pub mod cookie;
pub mod error;
pub mod health;
pub mod root;
pub mod token_refresh;
pub mod types;
pub mod user_login;
pub mod user_logout;
pub mod user_register;
