//! Engine configuration
//!
//! One aggregate struct covering every subsystem, loadable from TOML.
//! Every section and field has a default, so an empty file (or no file
//! at all) yields the standard policy.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consolidation::ConsolidationConfig;
use crate::decay::DecayConfig;
use crate::error::{EngineError, Result};
use crate::policy::PolicyConfig;
use crate::retrieval::RankerConfig;

// ============================================================================
// SECTIONS
// ============================================================================

/// Feedback-loop tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackConfig {
    /// Trailing usage window evaluated per adjustment pass, in hours
    pub window_hours: i64,
    /// Per-memory cooldown between adjustments, in hours
    pub cooldown_hours: i64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            cooldown_hours: 24,
        }
    }
}

/// Background job cadence and time budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// Seconds between consolidation runs
    pub consolidation_interval_secs: u64,
    /// Seconds between decay cycles
    pub decay_interval_secs: u64,
    /// Seconds between feedback adjustment passes
    pub feedback_interval_secs: u64,
    /// Hard time budget for one consolidation run
    pub consolidation_budget_secs: u64,
    /// Hard time budget for one decay cycle
    pub decay_budget_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            consolidation_interval_secs: 3600,
            decay_interval_secs: 3600,
            feedback_interval_secs: 3600,
            consolidation_budget_secs: 600,
            decay_budget_secs: 300,
        }
    }
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Tier thresholds, retention periods, adjustment rules
    pub policy: PolicyConfig,
    /// Relevance weights, decay constants, overfetch
    pub ranker: RankerConfig,
    /// Clustering window and thresholds
    pub consolidation: ConsolidationConfig,
    /// Archival threshold and idle decay rates
    pub decay: DecayConfig,
    /// Usage window and adjustment cooldown
    pub feedback: FeedbackConfig,
    /// Background job cadence
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|err| EngineError::Validation(format!("invalid config: {}", err)))
    }

    /// Load from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            EngineError::Validation(format!("cannot read config {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&raw)
    }
}

// ============================================================================
// TESTS
// ============================================================================
