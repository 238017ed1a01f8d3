//! Access and refresh token minting.
//!
//! Both tokens are HS256 JWTs carrying the same public claims
//! (`fullName`, `phoneNumber`, `email`) plus `iat`, `exp` and a ULID `jti`.
//! They are signed with two different secrets, so an access token can never be
//! presented as a refresh token or the other way around.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use ulid::Ulid;

use crate::store::UserRecord;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("failed to encode token: {0}")]
    Encode(String),
    #[error("{0} token secret is empty")]
    EmptySecret(&'static str),
    #[error("access and refresh token secrets must differ")]
    SharedSecret,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => Self::Expired,
            JwtErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Public user fields embedded in every token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
}

impl From<&UserRecord> for Identity {
    fn from(record: &UserRecord) -> Self {
        Self {
            full_name: record.full_name.clone(),
            phone_number: record.phone_number.clone(),
            email: record.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub identity: Identity,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

struct TokenKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKey {
    fn from_secret(secret: &SecretString, name: &'static str) -> Result<Self, TokenError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(TokenError::EmptySecret(name));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        })
    }

    fn sign(&self, identity: &Identity, issued_at: i64, ttl: Duration) -> Result<String, TokenError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            identity: identity.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl),
            jti: Ulid::new().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // TTLs are seconds long; the default 60s leeway would outlive them.
        validation.leeway = 0;
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Signs and verifies both token kinds.
pub struct TokenIssuer {
    access: TokenKey,
    refresh: TokenKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access", &"***")
            .field("refresh", &"***")
            .finish()
    }
}

impl TokenIssuer {
    /// Build an issuer from the two signing secrets.
    ///
    /// # Errors
    /// Returns an error if either secret is empty or both are the same.
    pub fn new(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
    ) -> Result<Self, TokenError> {
        if access_secret.expose_secret() == refresh_secret.expose_secret() {
            return Err(TokenError::SharedSecret);
        }
        Ok(Self {
            access: TokenKey::from_secret(access_secret, "access")?,
            refresh: TokenKey::from_secret(refresh_secret, "refresh")?,
        })
    }

    /// Mint an access token valid for `ttl`.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_access(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        self.access.sign(identity, now_unix_seconds(), ttl)
    }

    /// Mint a refresh token valid for `ttl`.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_refresh(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        self.refresh.sign(identity, now_unix_seconds(), ttl)
    }

    /// Verify an access token's signature and expiry.
    ///
    /// # Errors
    /// Returns an error if the token is expired, forged or malformed.
    pub fn verify_access(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.access.verify(token)
    }

    /// Verify a refresh token's signature and expiry.
    ///
    /// # Errors
    /// Returns an error if the token is expired, forged or malformed.
    pub fn verify_refresh(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.refresh.verify(token)
    }

    #[cfg(test)]
    pub(crate) fn issue_refresh_at(
        &self,
        identity: &Identity,
        issued_at: i64,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.refresh.sign(identity, issued_at, ttl)
    }
}

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    const DAY: Duration = Duration::from_secs(86_400);

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("access-secret"),
            &SecretString::from("refresh-secret"),
        )
        .unwrap()
    }

    fn identity() -> Identity {
        Identity {
            full_name: "Ada Lovelace".to_string(),
            phone_number: "0812345678".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn claims_survive_round_trip() -> Result<()> {
        let issuer = issuer();
        let token = issuer.issue_access(&identity(), Duration::from_secs(20))?;
        let claims = issuer.verify_access(&token)?;
        assert_eq!(claims.identity, identity());
        assert_eq!(claims.exp - claims.iat, 20);
        Ok(())
    }

    #[test]
    fn claims_use_camel_case_names() -> Result<()> {
        let claims = SessionClaims {
            identity: identity(),
            iat: 1,
            exp: 2,
            jti: "id".to_string(),
        };
        let value = serde_json::to_value(&claims)?;
        assert_eq!(value["fullName"], "Ada Lovelace");
        assert_eq!(value["phoneNumber"], "0812345678");
        assert_eq!(value["email"], "ada@example.com");
        Ok(())
    }

    #[test]
    fn secrets_are_not_interchangeable() -> Result<()> {
        let issuer = issuer();
        let access = issuer.issue_access(&identity(), Duration::from_secs(20))?;
        let refresh = issuer.issue_refresh(&identity(), DAY)?;

        assert!(matches!(
            issuer.verify_refresh(&access),
            Err(TokenError::InvalidSignature)
        ));
        assert!(matches!(
            issuer.verify_access(&refresh),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn expired_refresh_token_is_rejected() -> Result<()> {
        let issuer = issuer();
        let token =
            issuer.issue_refresh_at(&identity(), now_unix_seconds() - 120, Duration::from_secs(60))?;
        assert!(matches!(
            issuer.verify_refresh(&token),
            Err(TokenError::Expired)
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            issuer().verify_refresh("not-a-jwt"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn consecutive_refresh_tokens_differ() -> Result<()> {
        let issuer = issuer();
        let first = issuer.issue_refresh(&identity(), DAY)?;
        let second = issuer.issue_refresh(&identity(), DAY)?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn rejects_shared_or_empty_secrets() {
        let same = SecretString::from("same");
        assert!(matches!(
            TokenIssuer::new(&same, &same),
            Err(TokenError::SharedSecret)
        ));
        assert!(matches!(
            TokenIssuer::new(
                &SecretString::from(""),
                &SecretString::from("refresh"),
            ),
            Err(TokenError::EmptySecret("access"))
        ));
    }
}
