//! Decay Evictor
//!
//! Two-phase lifecycle end for memory entries:
//!
//! 1. `apply_decay()` - recompute an ephemeral decay score for every
//!    live entry and soft-archive the ones below the threshold.
//!    Archival is terminal-but-recoverable: excluded from retrieval,
//!    still on disk.
//! 2. `purge_expired()` - hard-delete entries that are BOTH past their
//!    hard expiry AND already archived. The two-phase rule prevents
//!    deleting entries that are merely stale but still within policy.
//!
//! Both phases work per-entry: one failure is collected and reported,
//! never aborting the batch.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::{DecayTier, MemoryEntry};
use crate::store::{MemoryFilter, MemoryStore, VectorIndex};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for decay scoring and archival
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecayConfig {
    /// Entries whose decay score falls below this are archived
    pub archive_threshold: f64,
    /// Unexpired entries idle for less than this are never archived,
    /// whatever their score. Keeps freshly committed low-importance
    /// entries retrievable until they have actually gone stale.
    pub min_idle_hours: f64,
    /// Idle decay per hour for short-tier entries
    pub short_decay_lambda: f64,
    /// Idle decay per hour for medium-tier entries
    pub medium_decay_lambda: f64,
    /// Idle decay per hour for long-tier entries
    pub long_decay_lambda: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            archive_threshold: 0.05,
            min_idle_hours: 24.0,
            short_decay_lambda: 0.01,
            medium_decay_lambda: 0.002,
            long_decay_lambda: 0.0001,
        }
    }
}

impl DecayConfig {
    fn lambda(&self, tier: DecayTier) -> f64 {
        match tier {
            DecayTier::Short => self.short_decay_lambda,
            DecayTier::Medium => self.medium_decay_lambda,
            DecayTier::Long => self.long_decay_lambda,
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Outcome of one decay cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayReport {
    /// Entries soft-archived this cycle
    pub archived: u64,
    /// Entries hard-deleted this cycle
    pub purged: u64,
    /// Per-entry failures collected across both phases
    pub failed: u64,
}

// ============================================================================
// DECAY EVICTOR
// ============================================================================

/// Recomputes decay scores, archives the weak, purges the expired
pub struct DecayEvictor {
    store: Arc<dyn MemoryStore>,
    index: Arc<dyn VectorIndex>,
    config: DecayConfig,
}

impl DecayEvictor {
    /// Create an evictor over the given collaborators
    pub fn new(
        store: Arc<dyn MemoryStore>,
        index: Arc<dyn VectorIndex>,
        config: DecayConfig,
    ) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Ephemeral decay score: normalized importance attenuated by idle
    /// time at the tier's decay rate. Used only for soft archival.
    pub fn decay_score(&self, entry: &MemoryEntry, now: chrono::DateTime<Utc>) -> f64 {
        if entry.is_expired_at(now) {
            return 0.0;
        }
        let lambda = self.config.lambda(entry.decay_tier);
        (entry.importance_score / 10.0) * (-lambda * entry.idle_hours_at(now)).exp()
    }

    /// Phase one: archive entries whose decay score fell below the
    /// threshold. Entries already past expiry score zero, so a single
    /// cycle can archive and then purge a long-expired entry. Unexpired
    /// entries get an idle grace period first: archival targets stale
    /// entries, not low-importance ones that just arrived.
    pub async fn apply_decay(&self) -> Result<DecayReport> {
        let now = Utc::now();
        let mut report = DecayReport::default();

        let filter = MemoryFilter {
            include_expired: true,
            ..Default::default()
        };
        let entries = self.store.scan(&filter).await?;

        for entry in entries {
            if !entry.is_expired_at(now) && entry.idle_hours_at(now) < self.config.min_idle_hours {
                continue;
            }
            if self.decay_score(&entry, now) >= self.config.archive_threshold {
                continue;
            }
            match self.store.set_archived(&entry.id, true).await {
                Ok(()) => {
                    report.archived += 1;
                    tracing::debug!(memory_id = %entry.id, tier = %entry.decay_tier, "entry archived");
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(memory_id = %entry.id, error = %err, "archive failed, skipping entry");
                }
            }
        }

        Ok(report)
    }

    /// Phase two: hard-delete entries past expiry that phase one (this
    /// cycle or an earlier one) already archived.
    pub async fn purge_expired(&self) -> Result<DecayReport> {
        let now = Utc::now();
        let mut report = DecayReport::default();

        let filter = MemoryFilter::everything();
        let entries = self.store.scan(&filter).await?;

        for entry in entries {
            if !(entry.archived && entry.is_expired_at(now)) {
                continue;
            }
            match self.store.delete(&entry.id).await {
                Ok(_) => {
                    // Vector cleanup is best-effort; a dangling vector is
                    // unreachable because retrieval re-checks the store.
                    if let Err(err) = self.index.remove(&entry.id).await {
                        tracing::warn!(memory_id = %entry.id, error = %err, "vector cleanup failed");
                    }
                    report.purged += 1;
                    tracing::debug!(memory_id = %entry.id, "entry purged");
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(memory_id = %entry.id, error = %err, "purge failed, skipping entry");
                }
            }
        }

        Ok(report)
    }

    /// One full cycle: decay pass, then purge pass
    pub async fn run_cycle(&self) -> Result<DecayReport> {
        let decay = self.apply_decay().await?;
        let purge = self.purge_expired().await?;
        let report = DecayReport {
            archived: decay.archived,
            purged: purge.purged,
            failed: decay.failed + purge.failed,
        };
        tracing::info!(
            archived = report.archived,
            purged = report.purged,
            failed = report.failed,
            "decay cycle finished"
        );
        Ok(report)
    }
}

// ============================================================================
// TESTS
// ============================================================================
