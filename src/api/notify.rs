//! Password-reset outbox worker and delivery abstractions.
//!
//! `POST /auth/reset-password` enqueues a row in `reset_outbox` with status
//! `pending`; the enqueue happens inside the request, so a failure there is
//! surfaced to the caller instead of being dropped. A background task
//! periodically polls the table, locks a batch via `FOR UPDATE SKIP LOCKED`,
//! and hands each row to a [`ResetSender`]. The sender decides how to
//! deliver (broker publish, SMTP, API) and returns `Ok`/`Err`. The worker
//! then marks the row `sent`, reschedules it with exponential backoff and
//! jitter, or marks it `failed` once the attempt limit is reached.
//!
//! Delivery is at-least-once; consumers must tolerate duplicates. The sender
//! handle is injected, never a process-wide global.
//!
//! The default sender for local dev is [`LogResetSender`], which logs the
//! payload and returns `Ok(())`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use super::handlers::auth::storage::UserRecord;

/// Single-use reset notification, serialized into the outbox row.
#[derive(Clone, Debug, Serialize, serde::Deserialize)]
pub struct ResetMessage {
    pub email: String,
    pub subject: String,
    pub body: String,
    pub datetime: DateTime<Utc>,
    pub user_id: Uuid,
    pub reset_token: String,
}

/// Build the reset message for a principal: fresh random token, link into
/// the frontend reset flow.
#[must_use]
pub fn build_reset_message(user: &UserRecord, frontend_base_url: &str) -> ResetMessage {
    let reset_token = Uuid::new_v4().to_string();
    let base = frontend_base_url.trim_end_matches('/');
    let reset_link = format!("{base}/reset-password?token={reset_token}");

    ResetMessage {
        email: user.email.clone(),
        subject: "Password Reset Request".to_string(),
        body: format!("Click the following link to reset your password: {reset_link}"),
        datetime: Utc::now(),
        user_id: user.id,
        reset_token,
    }
}

/// Delivery abstraction used by the outbox worker.
pub trait ResetSender: Send + Sync {
    /// Deliver a message or return an error to schedule a retry.
    ///
    /// # Errors
    /// Implementations return an error when delivery fails.
    fn send(&self, message: &ResetMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of publishing it.
#[derive(Clone, Debug)]
pub struct LogResetSender;

impl ResetSender for LogResetSender {
    fn send(&self, message: &ResetMessage) -> Result<()> {
        info!(
            email = %message.email,
            user_id = %message.user_id,
            "reset outbox send stub"
        );
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NotifyWorkerConfig {
    poll_interval: Duration,
    batch_size: usize,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl NotifyWorkerConfig {
    /// Default worker config: 5s poll interval, 10 messages per batch,
    /// 5 max attempts, and 5s->5m exponential backoff with jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 10,
            max_attempts: 5,
            backoff_base: Duration::from_secs(5),
            backoff_max: Duration::from_secs(300),
        }
    }

    #[must_use]
    pub fn with_poll_interval_seconds(mut self, seconds: u64) -> Self {
        self.poll_interval = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_backoff_base_seconds(mut self, seconds: u64) -> Self {
        self.backoff_base = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_backoff_max_seconds(mut self, seconds: u64) -> Self {
        self.backoff_max = Duration::from_secs(seconds);
        self
    }

    /// Clamp zero or inverted settings to workable values.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.poll_interval.is_zero() {
            self.poll_interval = Duration::from_secs(1);
        }
        if self.batch_size == 0 {
            self.batch_size = 1;
        }
        if self.max_attempts == 0 {
            self.max_attempts = 1;
        }
        if self.backoff_base.is_zero() {
            self.backoff_base = Duration::from_secs(1);
        }
        if self.backoff_max < self.backoff_base {
            self.backoff_max = self.backoff_base;
        }
        self
    }
}

impl Default for NotifyWorkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Enqueue a reset message durably. Called inside the request; a failure
/// here is the caller's failure.
///
/// # Errors
/// Returns an error if serialization or the insert fails.
pub async fn enqueue_reset(pool: &PgPool, message: &ResetMessage) -> Result<()> {
    let payload = serde_json::to_string(message).context("serialize reset message")?;

    sqlx::query(
        "INSERT INTO reset_outbox (user_id, email, reset_token, payload_json) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(message.user_id)
    .bind(&message.email)
    .bind(&message.reset_token)
    .bind(payload)
    .execute(pool)
    .await
    .context("enqueue reset message")?;

    Ok(())
}

/// Spawn the background worker that drains the outbox.
pub fn spawn_outbox_worker(
    pool: PgPool,
    sender: Arc<dyn ResetSender>,
    config: NotifyWorkerConfig,
) {
    tokio::spawn(async move {
        loop {
            if let Err(err) = drain_batch(&pool, sender.as_ref(), config).await {
                error!("reset outbox poll failed: {err:#}");
            }
            sleep(config.poll_interval).await;
        }
    });
}

async fn drain_batch(
    pool: &PgPool,
    sender: &dyn ResetSender,
    config: NotifyWorkerConfig,
) -> Result<()> {
    let mut tx = pool.begin().await.context("begin outbox transaction")?;

    let rows = sqlx::query(
        "SELECT id, user_id, email, reset_token, payload_json, attempts \
         FROM reset_outbox \
         WHERE status = 'pending' AND next_attempt_at <= now() \
         ORDER BY next_attempt_at \
         LIMIT $1 \
         FOR UPDATE SKIP LOCKED",
    )
    .bind(i64::try_from(config.batch_size).unwrap_or(10))
    .fetch_all(&mut *tx)
    .await
    .context("lock outbox batch")?;

    for row in rows {
        let id: i64 = row.get("id");
        let attempts: i32 = row.get("attempts");
        let payload: String = row.get("payload_json");

        let message: ResetMessage = match serde_json::from_str(&payload) {
            Ok(message) => message,
            Err(err) => {
                // A row that cannot be parsed will never deliver; park it.
                error!(id, "undeliverable reset payload: {err}");
                sqlx::query("UPDATE reset_outbox SET status = 'failed' WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("mark outbox row failed")?;
                continue;
            }
        };

        match sender.send(&message) {
            Ok(()) => {
                sqlx::query("UPDATE reset_outbox SET status = 'sent' WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("mark outbox row sent")?;
            }
            Err(err) => {
                let next_attempt = attempts.saturating_add(1);
                if next_attempt >= i32::try_from(config.max_attempts).unwrap_or(i32::MAX) {
                    error!(id, "reset delivery failed permanently: {err:#}");
                    sqlx::query(
                        "UPDATE reset_outbox SET status = 'failed', attempts = $2 WHERE id = $1",
                    )
                    .bind(id)
                    .bind(next_attempt)
                    .execute(&mut *tx)
                    .await
                    .context("mark outbox row failed")?;
                } else {
                    let delay = backoff_with_jitter(config, u32::try_from(next_attempt).unwrap_or(1));
                    error!(
                        id,
                        attempt = next_attempt,
                        delay_seconds = delay.as_secs(),
                        "reset delivery failed, retrying: {err:#}"
                    );
                    sqlx::query(
                        "UPDATE reset_outbox \
                         SET attempts = $2, next_attempt_at = now() + ($3 * interval '1 second') \
                         WHERE id = $1",
                    )
                    .bind(id)
                    .bind(next_attempt)
                    .bind(i64::try_from(delay.as_secs()).unwrap_or(300))
                    .execute(&mut *tx)
                    .await
                    .context("reschedule outbox row")?;
                }
            }
        }
    }

    tx.commit().await.context("commit outbox transaction")?;
    Ok(())
}

/// Exponential backoff capped at the configured max.
fn backoff_base_delay(config: NotifyWorkerConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let scaled = config
        .backoff_base
        .saturating_mul(2u32.saturating_pow(exponent));
    scaled.min(config.backoff_max)
}

fn backoff_with_jitter(config: NotifyWorkerConfig, attempt: u32) -> Duration {
    let base = backoff_base_delay(config, attempt);
    // Up to 25% jitter keeps concurrent workers from thundering.
    let jitter_ceiling = (base.as_secs() / 4).max(1);
    let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);
    (base + Duration::from_secs(jitter)).min(config.backoff_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> UserRecord {
        use super::super::handlers::auth::types::Role;
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            surname: "Smith".to_string(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            phone_number: None,
            password_hash: "hash".to_string(),
            role: Role::User,
            group_id: None,
            is_blocked: false,
            image_path: None,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn reset_message_links_into_frontend() {
        let message = build_reset_message(&user(), "https://custos.dev/");
        assert_eq!(message.email, "a@x.com");
        assert_eq!(message.subject, "Password Reset Request");
        assert!(message
            .body
            .contains("https://custos.dev/reset-password?token="));
        assert!(message.body.contains(&message.reset_token));
    }

    #[test]
    fn reset_tokens_are_unique_per_message() {
        let user = user();
        let first = build_reset_message(&user, "https://custos.dev");
        let second = build_reset_message(&user, "https://custos.dev");
        assert_ne!(first.reset_token, second.reset_token);
    }

    #[test]
    fn normalize_clamps_degenerate_settings() {
        let config = NotifyWorkerConfig::new()
            .with_poll_interval_seconds(0)
            .with_batch_size(0)
            .with_max_attempts(0)
            .with_backoff_base_seconds(0)
            .with_backoff_max_seconds(0)
            .normalize();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert!(config.backoff_max >= config.backoff_base);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = NotifyWorkerConfig::new(); // 5s base, 300s max
        assert_eq!(backoff_base_delay(config, 1), Duration::from_secs(5));
        assert_eq!(backoff_base_delay(config, 2), Duration::from_secs(10));
        assert_eq!(backoff_base_delay(config, 3), Duration::from_secs(20));
        assert_eq!(backoff_base_delay(config, 10), Duration::from_secs(300));
        assert_eq!(backoff_base_delay(config, 100), Duration::from_secs(300));
    }

    #[test]
    fn jittered_backoff_respects_cap() {
        let config = NotifyWorkerConfig::new();
        for attempt in 1..12 {
            let delay = backoff_with_jitter(config, attempt);
            assert!(delay <= Duration::from_secs(300));
            assert!(delay >= backoff_base_delay(config, attempt).min(Duration::from_secs(300)));
        }
    }
}
