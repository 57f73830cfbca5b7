//! Per-subject request limiting over a rolling window.
//!
//! Admission is one `INSERT … SELECT … WHERE count < max` statement, so two
//! concurrent requests can't both take the last slot. Rows that fall out of
//! the window are pruned after an admitted request.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::database::Database;
use crate::error::{CounselorError, CounselorResult};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Milliseconds until a slot frees up; zero when allowed.
    pub wait_time_ms: i64,
}

impl RateLimitDecision {
    /// Whole seconds to wait, rounded up, at least one.
    pub fn wait_time_secs(&self) -> u64 {
        ((self.wait_time_ms.max(1) as u64) + 999) / 1000
    }

    pub fn into_result(self) -> CounselorResult<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(CounselorError::RateLimited {
                wait_time_secs: self.wait_time_secs(),
            })
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    database: Database,
    clock: Arc<dyn Clock>,
    enabled: bool,
    max_requests: i64,
    window_ms: i64,
}

impl RateLimiter {
    pub fn new(database: Database, config: &RateLimitConfig) -> Self {
        Self::with_clock(database, config, Arc::new(SystemClock))
    }

    pub fn with_clock(database: Database, config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            database,
            clock,
            enabled: config.enabled,
            max_requests: i64::from(config.max_requests),
            window_ms: config.window_secs as i64 * 1000,
        }
    }

    pub async fn check(&self, subject: &str) -> CounselorResult<RateLimitDecision> {
        if !self.enabled {
            return Ok(RateLimitDecision {
                allowed: true,
                wait_time_ms: 0,
            });
        }

        let now = self.clock.now().timestamp_millis();
        // Requests at or after this instant still occupy a slot.
        let horizon = now - self.window_ms;

        let admitted = sqlx::query(
            r#"
            INSERT INTO rate_limit_events (subject, requested_at)
            SELECT ?, ?
            WHERE (
                SELECT COUNT(*) FROM rate_limit_events
                WHERE subject = ? AND requested_at >= ?
            ) < ?
            "#,
        )
        .bind(subject)
        .bind(now)
        .bind(subject)
        .bind(horizon)
        .bind(self.max_requests)
        .execute(self.database.pool())
        .await?
        .rows_affected()
            == 1;

        if admitted {
            sqlx::query("DELETE FROM rate_limit_events WHERE subject = ? AND requested_at < ?")
                .bind(subject)
                .bind(horizon)
                .execute(self.database.pool())
                .await?;

            debug!("Rate limit admitted {}", subject);
            return Ok(RateLimitDecision {
                allowed: true,
                wait_time_ms: 0,
            });
        }

        let oldest: Option<i64> = sqlx::query_scalar(
            "SELECT MIN(requested_at) FROM rate_limit_events WHERE subject = ? AND requested_at >= ?",
        )
        .bind(subject)
        .bind(horizon)
        .fetch_one(self.database.pool())
        .await?;

        // The oldest request stops counting one millisecond past the window.
        let wait_time_ms = oldest
            .map(|oldest| oldest + self.window_ms + 1 - now)
            .unwrap_or(self.window_ms)
            .max(1);

        warn!("Rate limit hit for {} (retry in {}ms)", subject, wait_time_ms);
        Ok(RateLimitDecision {
            allowed: false,
            wait_time_ms,
        })
    }
}

pub fn user_subject(user_id: &str) -> String {
    format!("user:{}", user_id)
}

/// Anonymous callers are keyed by a digest of their address, never the raw IP.
pub fn anonymous_subject(client_address: &str) -> String {
    let digest = Sha256::digest(client_address.as_bytes());
    format!("anon:{}", hex::encode(&digest[..16]))
}
