//! Session protocol: registration, login, refresh and logout.
//!
//! ```text
//! Anonymous --register--> Registered
//! Registered --login--> Active(token A)
//! Active(A) --login--> Active(B)        A is now rejected
//! Active(A) --refresh(A)--> Active(A)   new access token
//! Active(A) --logout(A)--> Registered
//! ```

mod config;
mod error;
mod password;
mod protocol;
pub mod tokens;

pub use config::SessionConfig;
pub use error::{ErrorKind, SessionError};
pub use password::{BCRYPT_COST, hash_password, verify_password};
pub use protocol::{LoginForm, LoginGrant, LogoutOutcome, RegisterForm, SessionProtocol};
pub use tokens::{Identity, SessionClaims, TokenError, TokenIssuer};
