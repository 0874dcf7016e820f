use crate::api::{
    self,
    handlers::auth::AuthConfig,
    notify::NotifyWorkerConfig,
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub redis_url: String,
    pub jwt_secret: SecretString,
    pub frontend_base_url: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub blacklist_ttl_seconds: u64,
    pub store_timeout_seconds: u64,
    pub reset_outbox_poll_seconds: u64,
    pub reset_outbox_batch_size: usize,
    pub reset_outbox_max_attempts: u32,
    pub reset_outbox_backoff_base_seconds: u64,
    pub reset_outbox_backoff_max_seconds: u64,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if store connections cannot be established or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.jwt_secret, args.frontend_base_url)
        .with_access_token_ttl_minutes(args.access_token_ttl_minutes)
        .with_refresh_token_ttl_days(args.refresh_token_ttl_days)
        .with_blacklist_ttl_seconds(args.blacklist_ttl_seconds)
        .with_store_timeout_seconds(args.store_timeout_seconds);

    let notify_config = NotifyWorkerConfig::new()
        .with_poll_interval_seconds(args.reset_outbox_poll_seconds)
        .with_batch_size(args.reset_outbox_batch_size)
        .with_max_attempts(args.reset_outbox_max_attempts)
        .with_backoff_base_seconds(args.reset_outbox_backoff_base_seconds)
        .with_backoff_max_seconds(args.reset_outbox_backoff_max_seconds)
        .normalize();

    api::new(args.port, args.dsn, args.redis_url, auth_config, notify_config).await
}
