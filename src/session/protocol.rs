//! Register, login, refresh and logout.
//!
//! State per user is a single stored refresh token:
//!
//! - login writes a new token and thereby invalidates the previous one
//!   (rotation-by-overwrite, one live session per user);
//! - refresh requires the presented token to equal the stored one and to
//!   verify against the refresh secret, and never rotates it;
//! - logout clears it.
//!
//! Two concurrent logins for the same user both succeed and the last write
//! wins; only the token from that write keeps working.

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    config::SessionConfig,
    error::SessionError,
    password::{hash_password, verify_password},
    tokens::{Identity, TokenIssuer},
};
use crate::store::{CredentialStore, InsertOutcome, NewUser, UserFilter, UserPatch};

#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Tokens minted by a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginGrant {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// A stored refresh token was cleared.
    Cleared,
    /// No cookie, or no record holds that token.
    NothingToClear,
}

pub struct SessionProtocol {
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProtocol")
            .field("tokens", &self.tokens)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionProtocol {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer, config: SessionConfig) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create a user record.
    ///
    /// # Errors
    /// Validation errors for empty fields, mismatched passwords or a malformed
    /// email; [`SessionError::EmailTaken`] for a duplicate; internal errors for
    /// store or hashing failures. No record is written on any error path.
    #[instrument(skip_all)]
    pub async fn register(&self, form: RegisterForm) -> Result<(), SessionError> {
        let first_name = required(form.first_name, "firstName")?;
        let last_name = required(form.last_name, "lastName")?;
        let phone_number = required(form.phone_number, "phoneNumber")?;
        let email = required(form.email, "email")?;
        let password = required(form.password, "password")?;
        let confirm_password = required(form.confirm_password, "confirmPassword")?;

        if password != confirm_password {
            return Err(SessionError::PasswordMismatch);
        }

        let email = normalize_email(&email);
        if !valid_email(&email) {
            return Err(SessionError::InvalidEmail);
        }

        if self
            .store
            .find_one(&UserFilter::Email(email.clone()))
            .await?
            .is_some()
        {
            debug!("email already registered");
            return Err(SessionError::EmailTaken);
        }

        let password_hash = hash_password(&password).await?;
        let user = NewUser {
            full_name: format!("{first_name} {last_name}"),
            first_name,
            last_name,
            phone_number,
            email,
            password_hash,
        };

        // A concurrent registration can win between the lookup and the insert.
        match self.store.insert(&user).await? {
            InsertOutcome::Created => {
                info!("user registered");
                Ok(())
            }
            InsertOutcome::Conflict => Err(SessionError::EmailTaken),
        }
    }

    /// Verify credentials and open a session.
    ///
    /// The stored refresh token is overwritten, which invalidates any token
    /// handed out by an earlier login.
    ///
    /// # Errors
    /// [`SessionError::EmailNotRegistered`] and [`SessionError::WrongPassword`]
    /// are reported separately; internal errors for store, hashing or signing
    /// failures.
    #[instrument(skip_all)]
    pub async fn login(&self, form: LoginForm) -> Result<LoginGrant, SessionError> {
        let email = normalize_email(&required(form.email, "email")?);
        let password = required(form.password, "password")?;

        let Some(record) = self
            .store
            .find_one(&UserFilter::Email(email.clone()))
            .await?
        else {
            debug!("email not registered");
            return Err(SessionError::EmailNotRegistered);
        };

        if !verify_password(&password, &record.password_hash).await? {
            debug!("wrong password");
            return Err(SessionError::WrongPassword);
        }

        let identity = Identity::from(&record);
        let access_token = self
            .tokens
            .issue_access(&identity, self.config.access_token_ttl())
            .map_err(SessionError::Signing)?;
        let refresh_token = self
            .tokens
            .issue_refresh(&identity, self.config.refresh_token_ttl())
            .map_err(SessionError::Signing)?;

        let matched = self
            .store
            .update_one(
                &UserFilter::Email(email),
                &UserPatch::set_refresh_token(refresh_token.clone()),
            )
            .await?;
        if !matched {
            // Records are never deleted here, so this only happens if the store lost it.
            warn!("user record vanished before the refresh token was stored");
            return Err(SessionError::EmailNotRegistered);
        }

        info!("session opened");

        Ok(LoginGrant {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a stored, valid refresh token for a new access token.
    ///
    /// # Errors
    /// [`SessionError::MissingRefreshToken`] without a token,
    /// [`SessionError::UnknownRefreshToken`] when no record holds it (never
    /// issued, superseded, or logged out), [`SessionError::InvalidRefreshToken`]
    /// when signature or expiry checks fail.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, SessionError> {
        let Some(refresh_token) = refresh_token.filter(|token| !token.is_empty()) else {
            return Err(SessionError::MissingRefreshToken);
        };

        let filter = UserFilter::RefreshToken(refresh_token.to_string());
        if self.store.find_one(&filter).await?.is_none() {
            debug!("refresh token not found in store");
            return Err(SessionError::UnknownRefreshToken);
        }

        let claims = self
            .tokens
            .verify_refresh(refresh_token)
            .map_err(SessionError::InvalidRefreshToken)?;

        self.tokens
            .issue_access(&claims.identity, self.config.refreshed_access_token_ttl())
            .map_err(SessionError::Signing)
    }

    /// Close the session holding `refresh_token`, if any.
    ///
    /// # Errors
    /// Only store failures; a missing or unknown token is
    /// [`LogoutOutcome::NothingToClear`].
    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<LogoutOutcome, SessionError> {
        let Some(refresh_token) = refresh_token.filter(|token| !token.is_empty()) else {
            return Ok(LogoutOutcome::NothingToClear);
        };

        let filter = UserFilter::RefreshToken(refresh_token.to_string());
        if self.store.find_one(&filter).await?.is_none() {
            return Ok(LogoutOutcome::NothingToClear);
        }

        // Filtering on the token itself leaves a session opened meanwhile by
        // another login untouched.
        let cleared = self
            .store
            .update_one(&filter, &UserPatch::clear_refresh_token())
            .await?;

        if cleared {
            info!("session closed");
            Ok(LogoutOutcome::Cleared)
        } else {
            Ok(LogoutOutcome::NothingToClear)
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SessionError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SessionError::MissingField(field)),
    }
}

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}
