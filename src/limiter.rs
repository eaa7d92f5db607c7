// SPDX-License-Identifier: Apache-2.0

//! Sliding-window submission limiter for the public contact endpoint.
//!
//! Each source address gets a one-hour window tracked in the database:
//! 1. The first submission opens a ledger row with a count of one
//! 2. Later submissions inside the window increment the count
//! 3. Submissions beyond the cap are rejected until the window lapses
//!
//! The ledger survives restarts, so a redeploy never resets an open
//! window. Expired rows are pruned by [`SubmissionLimiter::sweep`],
//! which runs from a background task.

use crate::{config::RateLimitConfig, db::Database, error::Result, metrics};
use chrono::{Duration, Utc};
use tracing::{debug, info};

/// Result of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Submission admitted; the window now holds `count` submissions
    Allowed { count: u32 },
    /// Quota exhausted for this source address
    Limited,
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

/// Database-backed submission limiter.
#[derive(Clone)]
pub struct SubmissionLimiter {
    config: RateLimitConfig,
    db: Database,
}

impl SubmissionLimiter {
    /// Create a new limiter over the given database.
    pub fn new(db: Database, config: RateLimitConfig) -> Self {
        Self { config, db }
    }

    /// Check and record one submission attempt for a source address.
    ///
    /// A window is active while its start lies within the trailing
    /// configured period. The check and the increment are separate
    /// statements; two near-simultaneous submissions can both pass at
    /// the boundary, which over-admits by at most one and is accepted
    /// for this traffic.
    pub async fn check(&self, source_addr: &str) -> Result<QuotaDecision> {
        let now = Utc::now();
        let cutoff = now - self.window();

        match self.db.find_active_rate_limit(source_addr, cutoff).await? {
            Some(record) if record.submission_count >= self.config.max_submissions => {
                debug!(
                    source = %source_addr,
                    count = record.submission_count,
                    "Submission quota exhausted"
                );
                Ok(QuotaDecision::Limited)
            }
            Some(record) => {
                // Scoped to the exact window start so a row swept or
                // replaced mid-request is not resurrected.
                let updated = self
                    .db
                    .increment_rate_limit(source_addr, record.window_start)
                    .await?;

                let count = updated
                    .map(|row| row.submission_count)
                    .unwrap_or(record.submission_count + 1);
                debug!(source = %source_addr, count, "Submission recorded in open window");
                Ok(QuotaDecision::Allowed { count })
            }
            None => {
                let record = self.db.start_rate_limit_window(source_addr, now).await?;
                debug!(source = %source_addr, "Opened new submission window");
                Ok(QuotaDecision::Allowed {
                    count: record.submission_count,
                })
            }
        }
    }

    /// Remove ledger rows whose window has fully elapsed.
    ///
    /// Rows are deleted only when their start is older than one full
    /// window, so an active window is never cut short.
    pub async fn sweep(&self) -> Result<u64> {
        let cutoff = Utc::now() - self.window();
        let deleted = self.db.sweep_expired_rate_limits(cutoff).await?;

        if deleted > 0 {
            metrics::LEDGER_ROWS_SWEPT.inc_by(deleted);
            info!(deleted, "Pruned expired submission windows");
        }

        Ok(deleted)
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.config.window_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_limiter(max_submissions: u32) -> SubmissionLimiter {
        let db = Database::connect("memory").await.unwrap();
        let config = RateLimitConfig {
            max_submissions,
            ..Default::default()
        };
        SubmissionLimiter::new(db, config)
    }

    #[tokio::test]
    async fn test_submissions_under_cap_are_allowed() {
        let limiter = test_limiter(5).await;

        for expected in 1..=5 {
            match limiter.check("203.0.113.7").await.unwrap() {
                QuotaDecision::Allowed { count } => assert_eq!(count, expected),
                QuotaDecision::Limited => panic!("Should not be limited at {expected}"),
            }
        }
    }

    #[tokio::test]
    async fn test_sixth_submission_is_limited() {
        let limiter = test_limiter(5).await;

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.7").await.unwrap().is_allowed());
        }

        assert_eq!(
            limiter.check("203.0.113.7").await.unwrap(),
            QuotaDecision::Limited
        );
        // The rejected attempt must not consume quota state.
        assert_eq!(
            limiter.check("203.0.113.7").await.unwrap(),
            QuotaDecision::Limited
        );
    }

    #[tokio::test]
    async fn test_source_addresses_are_independent() {
        let limiter = test_limiter(1).await;

        assert!(limiter.check("203.0.113.7").await.unwrap().is_allowed());
        assert_eq!(
            limiter.check("203.0.113.7").await.unwrap(),
            QuotaDecision::Limited
        );

        // A different address still has its full quota.
        assert!(limiter.check("203.0.113.8").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_lapsed_window_opens_fresh_quota() {
        let limiter = test_limiter(2).await;
        let stale_start = Utc::now() - Duration::minutes(61);

        // Simulate an exhausted window that started 61 minutes ago.
        let row = limiter
            .db
            .start_rate_limit_window("203.0.113.7", stale_start)
            .await
            .unwrap();
        limiter
            .db
            .increment_rate_limit("203.0.113.7", row.window_start)
            .await
            .unwrap();

        // The stale window no longer counts; a new one opens at 1.
        match limiter.check("203.0.113.7").await.unwrap() {
            QuotaDecision::Allowed { count } => assert_eq!(count, 1),
            QuotaDecision::Limited => panic!("Lapsed window should not limit"),
        }

        let rows = limiter.db.list_rate_limits().await.unwrap();
        assert_eq!(rows.len(), 2, "stale and fresh windows coexist until swept");
    }

    #[tokio::test]
    async fn test_sweep_prunes_only_lapsed_windows() {
        let limiter = test_limiter(5).await;

        limiter
            .db
            .start_rate_limit_window("198.51.100.1", Utc::now() - Duration::hours(3))
            .await
            .unwrap();
        assert!(limiter.check("198.51.100.2").await.unwrap().is_allowed());

        let deleted = limiter.sweep().await.unwrap();
        assert_eq!(deleted, 1);

        let rows = limiter.db.list_rate_limits().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ip_address, "198.51.100.2");

        // Nothing left to prune on the next pass.
        assert_eq!(limiter.sweep().await.unwrap(), 0);
    }
}
