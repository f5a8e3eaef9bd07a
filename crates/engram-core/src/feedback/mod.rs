//! Feedback Loop
//!
//! Closes the lifecycle circle: aggregates the writeback log into
//! per-memory usage statistics, asks the policy engine for adjustment
//! recommendations, and applies them atomically to the store.
//!
//! Adjustments are rate-limited by a per-memory cooldown so a memory
//! cannot be re-adjusted on every pass while its usage window still
//! contains the observations that triggered the last change.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::memory::MemoryUsageStats;
use crate::policy::{AdjustmentDirection, MemoryPolicyEngine};
use crate::store::MemoryStore;
use crate::writeback::{ShardUsageType, WritebackTracker};

// ============================================================================
// METRICS
// ============================================================================

/// Aggregate usage metrics over a trailing window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackMetrics {
    /// Total usage observations in the window
    pub total_retrievals: u64,
    /// Observations classified as used
    pub total_used: u64,
    /// Observations classified as ignored top hits
    pub total_ignored_top_hits: u64,
    /// Observations classified as partially used
    pub total_partially_used: u64,
    /// total_used / total_retrievals, 0.0 when empty
    pub used_rate: f64,
    /// total_ignored_top_hits / total_retrievals, 0.0 when empty
    pub ignored_top_hit_rate: f64,
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Turns the raw writeback log into metrics and per-memory statistics
pub struct FeedbackAnalyzer {
    tracker: Arc<WritebackTracker>,
}

impl FeedbackAnalyzer {
    /// Create an analyzer over a writeback log
    pub fn new(tracker: Arc<WritebackTracker>) -> Self {
        Self { tracker }
    }

    /// Aggregate metrics over the trailing `window`
    pub async fn compute_metrics(&self, window: Duration) -> FeedbackMetrics {
        let links = self.tracker.links_since(Utc::now() - window).await;

        let mut metrics = FeedbackMetrics::default();
        for link in &links {
            metrics.total_retrievals += 1;
            match link.usage_type {
                ShardUsageType::UsedInResponse => metrics.total_used += 1,
                ShardUsageType::IgnoredTopHit => metrics.total_ignored_top_hits += 1,
                ShardUsageType::PartiallyUsed => metrics.total_partially_used += 1,
            }
        }

        if metrics.total_retrievals > 0 {
            let total = metrics.total_retrievals as f64;
            metrics.used_rate = metrics.total_used as f64 / total;
            metrics.ignored_top_hit_rate = metrics.total_ignored_top_hits as f64 / total;
        }
        metrics
    }

    /// Per-memory usage statistics over the trailing `window`.
    ///
    /// Only ignored top hits count as ignores; partially-used links were
    /// never a strong-enough signal either way, so they only widen the
    /// retrieval total.
    pub async fn per_memory_stats(&self, window: Duration) -> HashMap<String, MemoryUsageStats> {
        let now = Utc::now();
        let links = self.tracker.links_since(now - window).await;

        let mut stats: HashMap<String, MemoryUsageStats> = HashMap::new();
        let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();

        for link in &links {
            let entry = stats
                .entry(link.memory_id.clone())
                .or_insert_with(|| MemoryUsageStats {
                    memory_id: link.memory_id.clone(),
                    ..Default::default()
                });
            entry.total_retrievals += 1;
            match link.usage_type {
                ShardUsageType::UsedInResponse => entry.usage_count += 1,
                ShardUsageType::IgnoredTopHit => entry.ignore_count += 1,
                ShardUsageType::PartiallyUsed => {}
            }

            let newest = latest.entry(link.memory_id.clone()).or_insert(link.timestamp);
            if link.timestamp > *newest {
                *newest = link.timestamp;
            }
        }

        for (id, entry) in stats.iter_mut() {
            if let Some(ts) = latest.get(id) {
                let age_hours = (now - *ts).num_seconds() as f64 / 3600.0;
                // Week-scale freshness: 1.0 just observed, ~0.37 after a week
                entry.recency_score = (-age_hours.max(0.0) / 168.0).exp();
            }
        }
        stats
    }
}

// ============================================================================
// ADAPTIVE ADJUSTER
// ============================================================================

/// Outcome of one adjustment pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentReport {
    /// Memories with enough samples to evaluate
    pub evaluated: u64,
    /// Memories promoted one tier
    pub promoted: u64,
    /// Memories demoted one tier
    pub demoted: u64,
    /// Memories skipped because a recent adjustment is still cooling down
    pub skipped_cooldown: u64,
    /// Per-memory update failures
    pub failed: u64,
}

/// Applies policy recommendations derived from observed usage
pub struct AdaptivePolicyAdjuster {
    store: Arc<dyn MemoryStore>,
    analyzer: FeedbackAnalyzer,
    policy: MemoryPolicyEngine,
    cooldown: Duration,
    last_adjusted: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl AdaptivePolicyAdjuster {
    /// Create an adjuster with the standard 24h per-memory cooldown
    pub fn new(
        store: Arc<dyn MemoryStore>,
        tracker: Arc<WritebackTracker>,
        policy: MemoryPolicyEngine,
    ) -> Self {
        Self {
            store,
            analyzer: FeedbackAnalyzer::new(tracker),
            policy,
            cooldown: Duration::hours(24),
            last_adjusted: RwLock::new(HashMap::new()),
        }
    }

    /// Override the per-memory cooldown
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Evaluate the usage window and apply at most one single-step
    /// adjustment per eligible memory.
    pub async fn adjust_policy(&self, window: Duration) -> Result<AdjustmentReport> {
        let now = Utc::now();
        let mut report = AdjustmentReport::default();

        // Expired cooldowns no longer block anything; drop them so the
        // map tracks recently adjusted memories, not all of history
        self.last_adjusted
            .write()
            .await
            .retain(|_, adjusted_at| now - *adjusted_at < self.cooldown);

        let stats = self.analyzer.per_memory_stats(window).await;
        let min_samples = self.policy.config().min_samples;

        // Deterministic iteration order keeps pass results reproducible
        let mut memory_ids: Vec<&String> = stats.keys().collect();
        memory_ids.sort();

        for memory_id in memory_ids {
            let usage = &stats[memory_id];
            if usage.total_retrievals < min_samples {
                continue;
            }
            report.evaluated += 1;

            if let Some(adjusted_at) = self.last_adjusted.read().await.get(memory_id) {
                if now - *adjusted_at < self.cooldown {
                    report.skipped_cooldown += 1;
                    continue;
                }
            }

            // Purged or never-committed ids can linger in the log
            let Some(entry) = self.store.get(memory_id).await? else {
                continue;
            };
            if entry.archived {
                continue;
            }

            let Some(rec) =
                self.policy
                    .evaluate_for_adjustment(entry.decay_tier, entry.importance_score, usage)
            else {
                continue;
            };

            // New retention is anchored on the original creation time, so a
            // demotion can move the expiry into the past and hand the entry
            // to the next decay cycle.
            let expires_at = self.policy.calculate_expiry(rec.new_tier, entry.created_at);
            match self
                .store
                .update_tier_and_importance(memory_id, rec.new_tier, rec.new_importance, expires_at)
                .await
            {
                Ok(()) => {
                    self.last_adjusted
                        .write()
                        .await
                        .insert(memory_id.clone(), now);
                    match rec.direction {
                        AdjustmentDirection::Promote => report.promoted += 1,
                        AdjustmentDirection::Demote => report.demoted += 1,
                    }
                    tracing::info!(
                        memory_id = %memory_id,
                        direction = ?rec.direction,
                        new_tier = %rec.new_tier,
                        new_importance = rec.new_importance,
                        "policy adjustment applied"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(memory_id = %memory_id, error = %err, "policy adjustment failed");
                }
            }
        }

        Ok(report)
    }

    /// Aggregate metrics over the trailing window (stats surface)
    pub async fn metrics(&self, window: Duration) -> FeedbackMetrics {
        self.analyzer.compute_metrics(window).await
    }

    #[cfg(test)]
    async fn tracked_cooldowns(&self) -> usize {
        self.last_adjusted.read().await.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
