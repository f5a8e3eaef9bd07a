//! Memory module - Core types and data structures
//!
//! Implements the tri-partite memory model:
//! - Episodic: conversational events (decay fastest)
//! - Procedural: learned action patterns with tool success rates
//! - Semantic: distilled knowledge derived by consolidation
//!
//! Every entry carries a decay tier derived from its importance score;
//! the tier determines retention length and decay speed.

mod entry;
mod request;

pub use entry::{DecayTier, MemoryEntry, MemoryType, ProceduralProfile};
pub use request::{
    recency_label, CommitReceipt, CommitRequest, ContextHit, QueryRequest, QueryResponse,
};

use serde::{Deserialize, Serialize};

// ============================================================================
// USAGE STATISTICS
// ============================================================================

/// Per-memory usage statistics feeding the policy feedback loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsageStats {
    /// Memory this window of observations belongs to
    pub memory_id: String,
    /// Times the memory was used in a downstream response
    pub usage_count: u64,
    /// Times the memory was retrieved but ignored
    pub ignore_count: u64,
    /// Total retrieval observations in the window
    pub total_retrievals: u64,
    /// Recency of the most recent observation, 0.0 (stale) to 1.0 (fresh)
    pub recency_score: f64,
}

impl MemoryUsageStats {
    /// Fraction of retrievals that ended up ignored
    pub fn ignore_rate(&self) -> f64 {
        self.ignore_count as f64 / (self.total_retrievals.max(1)) as f64
    }
}
