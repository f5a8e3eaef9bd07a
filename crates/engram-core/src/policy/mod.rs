//! Memory Policy Engine
//!
//! Pure, side-effect-free policy logic:
//! - importance → decay tier (deterministic step function)
//! - decay tier → retention length → hard expiry
//! - usage statistics → tier/importance adjustment recommendations
//!
//! Recommendations move at most one tier per evaluation so the feedback
//! loop cannot oscillate a memory across the whole tier range.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::memory::{DecayTier, MemoryUsageStats};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Thresholds and retention periods driving the policy engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    /// Importance at or above which an entry is long-tier
    pub long_threshold: f64,
    /// Importance at or above which an entry is medium-tier
    pub medium_threshold: f64,
    /// Retention in days for short-tier entries
    pub short_retention_days: i64,
    /// Retention in days for medium-tier entries
    pub medium_retention_days: i64,
    /// Retention in days for long-tier entries
    pub long_retention_days: i64,
    /// Usage count at or above which promotion is considered
    pub promote_threshold: u64,
    /// Promotion requires the ignore rate to stay below this
    pub ignore_ceiling: f64,
    /// Demotion triggers when the ignore rate exceeds this
    pub demote_ceiling: f64,
    /// Minimum observations before any adjustment
    pub min_samples: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            long_threshold: 8.0,
            medium_threshold: 5.0,
            short_retention_days: 7,
            medium_retention_days: 30,
            long_retention_days: 365,
            promote_threshold: 5,
            ignore_ceiling: 0.3,
            demote_ceiling: 0.6,
            min_samples: 5,
        }
    }
}

// ============================================================================
// RECOMMENDATIONS
// ============================================================================

/// Direction of a recommended tier change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    /// Move up one tier, importance +1
    Promote,
    /// Move down one tier, importance -1
    Demote,
}

/// A single-step tier/importance change recommended by the policy engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRecommendation {
    /// Whether this is a promotion or demotion
    pub direction: AdjustmentDirection,
    /// Tier after the adjustment (one step from the current tier)
    pub new_tier: DecayTier,
    /// Importance after the adjustment, clamped to [0, 10]
    pub new_importance: f64,
}

// ============================================================================
// POLICY ENGINE
// ============================================================================

/// Maps importance to decay tiers and evaluates usage into adjustments
#[derive(Debug, Clone, Default)]
pub struct MemoryPolicyEngine {
    config: PolicyConfig,
}

impl MemoryPolicyEngine {
    /// Create a policy engine with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Current configuration
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Reject importance values outside [0, 10]
    pub fn validate_importance(&self, importance: f64) -> Result<()> {
        if !importance.is_finite() || !(0.0..=10.0).contains(&importance) {
            return Err(EngineError::Validation(format!(
                "importance_score must be within [0, 10], got {}",
                importance
            )));
        }
        Ok(())
    }

    /// Deterministic step function from importance to tier.
    ///
    /// Monotonic non-decreasing in importance:
    /// `>= long_threshold` → Long, `>= medium_threshold` → Medium,
    /// else Short.
    pub fn assign_decay_tier(&self, importance: f64) -> DecayTier {
        if importance >= self.config.long_threshold {
            DecayTier::Long
        } else if importance >= self.config.medium_threshold {
            DecayTier::Medium
        } else {
            DecayTier::Short
        }
    }

    /// Retention period for a tier
    pub fn retention(&self, tier: DecayTier) -> Duration {
        let days = match tier {
            DecayTier::Short => self.config.short_retention_days,
            DecayTier::Medium => self.config.medium_retention_days,
            DecayTier::Long => self.config.long_retention_days,
        };
        Duration::days(days)
    }

    /// Hard expiry for an entry created at `created_at` on `tier`
    pub fn calculate_expiry(&self, tier: DecayTier, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + self.retention(tier)
    }

    /// Evaluate a memory's usage statistics into an adjustment.
    ///
    /// Promotion: usage_count >= promote_threshold AND ignore rate below
    /// the ceiling. Demotion: ignore rate above demote_ceiling over at
    /// least min_samples retrievals. Never both; promotion wins when its
    /// conditions hold.
    pub fn evaluate_for_adjustment(
        &self,
        current_tier: DecayTier,
        current_importance: f64,
        stats: &MemoryUsageStats,
    ) -> Option<AdjustmentRecommendation> {
        let ignore_rate = stats.ignore_rate();

        if stats.usage_count >= self.config.promote_threshold
            && ignore_rate < self.config.ignore_ceiling
        {
            return Some(AdjustmentRecommendation {
                direction: AdjustmentDirection::Promote,
                new_tier: current_tier.promoted(),
                new_importance: (current_importance + 1.0).min(10.0),
            });
        }

        if stats.total_retrievals >= self.config.min_samples
            && ignore_rate > self.config.demote_ceiling
        {
            return Some(AdjustmentRecommendation {
                direction: AdjustmentDirection::Demote,
                new_tier: current_tier.demoted(),
                new_importance: (current_importance - 1.0).max(0.0),
            });
        }

        None
    }
}

// ============================================================================
// TESTS
// ============================================================================
