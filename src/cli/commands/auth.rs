use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ACCESS_TOKEN_SECRET: &str = "access-token-secret";
pub const ARG_REFRESH_TOKEN_SECRET: &str = "refresh-token-secret";
pub const ARG_ACCESS_TOKEN_TTL_SECONDS: &str = "access-token-ttl-seconds";
pub const ARG_REFRESHED_ACCESS_TOKEN_TTL_SECONDS: &str = "refreshed-access-token-ttl-seconds";
pub const ARG_REFRESH_TOKEN_TTL_SECONDS: &str = "refresh-token-ttl-seconds";
pub const ARG_INSECURE_COOKIE: &str = "insecure-cookie";
pub const ARG_CORS_ORIGIN: &str = "cors-origin";

#[derive(Debug)]
pub struct Options {
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: u64,
    pub refreshed_access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub insecure_cookie: bool,
    pub cors_origins: Vec<String>,
}

impl Options {
    /// Parse token and cookie arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_secret = |id: &str| -> Result<SecretString> {
            matches
                .get_one::<String>(id)
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::from(v.clone()))
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };
        let read_seconds = |id: &str| -> Result<u64> {
            matches
                .get_one::<u64>(id)
                .copied()
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            access_token_secret: read_secret(ARG_ACCESS_TOKEN_SECRET)?,
            refresh_token_secret: read_secret(ARG_REFRESH_TOKEN_SECRET)?,
            access_token_ttl_seconds: read_seconds(ARG_ACCESS_TOKEN_TTL_SECONDS)?,
            refreshed_access_token_ttl_seconds: read_seconds(
                ARG_REFRESHED_ACCESS_TOKEN_TTL_SECONDS,
            )?,
            refresh_token_ttl_seconds: read_seconds(ARG_REFRESH_TOKEN_TTL_SECONDS)?,
            insecure_cookie: matches.get_flag(ARG_INSECURE_COOKIE),
            cors_origins: matches
                .get_many::<String>(ARG_CORS_ORIGIN)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    let command = with_ttl_args(command);
    with_cookie_args(command)
}

fn with_secret_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_SECRET)
                .long(ARG_ACCESS_TOKEN_SECRET)
                .help("HMAC secret used to sign access tokens")
                .env("SESI_ACCESS_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_SECRET)
                .long(ARG_REFRESH_TOKEN_SECRET)
                .help("HMAC secret used to sign refresh tokens, must differ from the access secret")
                .env("SESI_REFRESH_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
}

fn with_ttl_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .long(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .help("Access token TTL in seconds for tokens issued at login")
                .env("SESI_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("20")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REFRESHED_ACCESS_TOKEN_TTL_SECONDS)
                .long(ARG_REFRESHED_ACCESS_TOKEN_TTL_SECONDS)
                .help("Access token TTL in seconds for tokens issued by refresh")
                .env("SESI_REFRESHED_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .long(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .help("Refresh token and cookie TTL in seconds")
                .env("SESI_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

fn with_cookie_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_INSECURE_COOKIE)
                .long(ARG_INSECURE_COOKIE)
                .help("Omit the Secure attribute on the refresh cookie (plain HTTP development)")
                .env("SESI_INSECURE_COOKIE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long(ARG_CORS_ORIGIN)
                .help("Allowed CORS origin, repeat for several")
                .env("SESI_CORS_ORIGIN")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .default_value("http://localhost:8080"),
        )
}
