//! Storage-quota guard
//!
//! Measuring usage means aggregating the whole backing store, so the last
//! measurement is cached for a short window. Every successful write must call
//! [`QuotaGuard::invalidate`] so the next check measures again.
//!
//! The guard bounds growth. It does not serialize concurrent writers.
use crate::config::QuotaPolicy;
use crate::error::StoreError;
use crate::store::{UsageStats, UsageStatsProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaVerdict {
    pub allowed: bool,
    pub current_size_bytes: u64,
    pub current_row_count: u64,
    pub warning_message: Option<String>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait QuotaGuard: Send + Sync {
    async fn check_write_allowed(&self) -> Result<QuotaVerdict, StoreError>;

    /// Drops any cached measurement. Call after a write, before it returns.
    fn invalidate(&self);
}

#[derive(Debug, Clone, Copy)]
struct CachedUsage {
    stats: UsageStats,
    expires_at: Instant,
}

/// Evaluates a measurement against the policy. Hard limits are inclusive.
pub fn evaluate(policy: &QuotaPolicy, stats: UsageStats) -> QuotaVerdict {
    let mut verdict = QuotaVerdict {
        allowed: true,
        current_size_bytes: stats.size_bytes,
        current_row_count: stats.row_count,
        warning_message: None,
        error_message: None,
    };

    if stats.size_bytes >= policy.hard_bytes || stats.row_count >= policy.hard_rows {
        verdict.allowed = false;
        verdict.error_message = Some(format!(
            "storage limit reached ({} of {} bytes, {} of {} rows); delete old data or contact an administrator",
            stats.size_bytes, policy.hard_bytes, stats.row_count, policy.hard_rows
        ));
    } else if stats.size_bytes >= policy.warn_bytes || stats.row_count >= policy.warn_rows {
        verdict.warning_message = Some(format!(
            "storage is nearly full ({} of {} bytes, {} of {} rows)",
            stats.size_bytes, policy.hard_bytes, stats.row_count, policy.hard_rows
        ));
    }
    verdict
}

pub struct CachedQuotaGuard {
    provider: Arc<dyn UsageStatsProvider>,
    policy: QuotaPolicy,
    cache: Mutex<Option<CachedUsage>>,
}

impl CachedQuotaGuard {
    pub fn new(provider: Arc<dyn UsageStatsProvider>, policy: QuotaPolicy) -> Self {
        Self {
            provider,
            policy,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<UsageStats> {
        let cache = self.cache.lock();
        cache
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.stats)
    }
}

#[async_trait]
impl QuotaGuard for CachedQuotaGuard {
    async fn check_write_allowed(&self) -> Result<QuotaVerdict, StoreError> {
        let stats = match self.cached() {
            Some(stats) => stats,
            None => {
                let stats = self.provider.usage_stats().await?;
                *self.cache.lock() = Some(CachedUsage {
                    stats,
                    expires_at: Instant::now() + self.policy.cache_ttl,
                });
                tracing::debug!(
                    size_bytes = stats.size_bytes,
                    row_count = stats.row_count,
                    "storage usage measured"
                );
                stats
            }
        };

        let verdict = evaluate(&self.policy, stats);
        if !verdict.allowed {
            tracing::warn!(
                size_bytes = stats.size_bytes,
                row_count = stats.row_count,
                "write blocked by storage quota"
            );
        }
        Ok(verdict)
    }

    fn invalidate(&self) {
        self.cache.lock().take();
    }
}
