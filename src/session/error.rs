//! Failure taxonomy for the session protocol.

use super::tokens::TokenError;
use crate::store::StoreError;
use thiserror::Error;

/// Coarse class of a failure; the HTTP layer maps each class to a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client sent malformed or incomplete input.
    Validation,
    /// A unique key is already taken.
    Conflict,
    /// Bad credentials, or an absent/unknown/expired token.
    Auth,
    /// Store, hashing or signing failure.
    Internal,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Required field is empty: {0}")]
    MissingField(&'static str),
    #[error("Password and confirm password do not match")]
    PasswordMismatch,
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Email not registered")]
    EmailNotRegistered,
    #[error("Wrong password")]
    WrongPassword,
    #[error("Missing refresh token")]
    MissingRefreshToken,
    #[error("Refresh token not recognized")]
    UnknownRefreshToken,
    #[error("Refresh token rejected: {0}")]
    InvalidRefreshToken(#[source] TokenError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Token signing failed: {0}")]
    Signing(#[source] TokenError),
}

impl SessionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) | Self::PasswordMismatch | Self::InvalidEmail => {
                ErrorKind::Validation
            }
            Self::EmailTaken => ErrorKind::Conflict,
            Self::EmailNotRegistered
            | Self::WrongPassword
            | Self::MissingRefreshToken
            | Self::UnknownRefreshToken
            | Self::InvalidRefreshToken(_) => ErrorKind::Auth,
            Self::Store(_) | Self::PasswordHash(_) | Self::Signing(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code sent alongside the human message.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::PasswordMismatch => "password_mismatch",
            Self::InvalidEmail => "invalid_email",
            Self::EmailTaken => "email_taken",
            Self::EmailNotRegistered => "email_not_registered",
            Self::WrongPassword => "wrong_password",
            Self::MissingRefreshToken => "missing_refresh_token",
            Self::UnknownRefreshToken => "unknown_refresh_token",
            Self::InvalidRefreshToken(_) => "invalid_refresh_token",
            Self::Store(_) | Self::PasswordHash(_) | Self::Signing(_) => "internal",
        }
    }
}
