//! Maps validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .filter(|dsn| !dsn.trim().is_empty())
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        access_token_secret: auth_opts.access_token_secret,
        refresh_token_secret: auth_opts.refresh_token_secret,
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refreshed_access_token_ttl_seconds: auth_opts.refreshed_access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        insecure_cookie: auth_opts.insecure_cookie,
        cors_origins: auth_opts.cors_origins,
    }))
}
