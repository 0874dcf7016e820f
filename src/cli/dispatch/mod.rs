//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let redis_url = matches
        .get_one::<String>("redis-url")
        .cloned()
        .context("missing required argument: --redis-url")?;
    let jwt_secret = matches
        .get_one::<String>("jwt-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --jwt-secret")?;

    let frontend_base_url = matches
        .get_one::<String>("frontend-base-url")
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    Ok(Action::Server(Args {
        port,
        dsn,
        redis_url,
        jwt_secret,
        frontend_base_url,
        access_token_ttl_minutes: matches
            .get_one::<i64>("access-token-ttl-minutes")
            .copied()
            .unwrap_or(15),
        refresh_token_ttl_days: matches
            .get_one::<i64>("refresh-token-ttl-days")
            .copied()
            .unwrap_or(7),
        blacklist_ttl_seconds: matches
            .get_one::<u64>("blacklist-ttl-seconds")
            .copied()
            .unwrap_or(3600),
        store_timeout_seconds: matches
            .get_one::<u64>("store-timeout-seconds")
            .copied()
            .unwrap_or(5),
        reset_outbox_poll_seconds: matches
            .get_one::<u64>("reset-outbox-poll-seconds")
            .copied()
            .unwrap_or(5),
        reset_outbox_batch_size: matches
            .get_one::<usize>("reset-outbox-batch-size")
            .copied()
            .unwrap_or(10),
        reset_outbox_max_attempts: matches
            .get_one::<u32>("reset-outbox-max-attempts")
            .copied()
            .unwrap_or(5),
        reset_outbox_backoff_base_seconds: matches
            .get_one::<u64>("reset-outbox-backoff-base-seconds")
            .copied()
            .unwrap_or(5),
        reset_outbox_backoff_max_seconds: matches
            .get_one::<u64>("reset-outbox-backoff-max-seconds")
            .copied()
            .unwrap_or(300),
    }))
}
