//! Session timing and cookie configuration.

use std::time::Duration;

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 20;
const DEFAULT_REFRESHED_ACCESS_TOKEN_TTL_SECONDS: u64 = 30;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    access_token_ttl_seconds: u64,
    refreshed_access_token_ttl_seconds: u64,
    refresh_token_ttl_seconds: u64,
    cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refreshed_access_token_ttl_seconds: DEFAULT_REFRESHED_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            cookie_secure: true,
        }
    }

    /// TTL of the access token returned by login.
    #[must_use]
    pub const fn with_access_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    /// TTL of the access token returned by refresh.
    #[must_use]
    pub const fn with_refreshed_access_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.refreshed_access_token_ttl_seconds = seconds;
        self
    }

    /// TTL of the refresh token; also the refresh cookie's `Max-Age`.
    #[must_use]
    pub const fn with_refresh_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub const fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_seconds)
    }

    #[must_use]
    pub const fn refreshed_access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refreshed_access_token_ttl_seconds)
    }

    #[must_use]
    pub const fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_seconds)
    }

    #[must_use]
    pub const fn refresh_token_ttl_seconds(&self) -> u64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub const fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}
