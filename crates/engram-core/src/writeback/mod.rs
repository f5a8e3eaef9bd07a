//! Writeback Tracker
//!
//! Records which retrieved memories a downstream response actually
//! used. One immutable `ShardLink` per (response, hit) observation,
//! appended as a single atomic batch per response so the log is always
//! internally consistent and per-response ordered.
//!
//! The log is the sole input to the feedback loop; it is append-only
//! and aggregated on demand, never mutated in place.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::memory::ContextHit;

/// Ranks 0..TOP_HIT_RANKS count as "top hits" for ignore classification
const TOP_HIT_RANKS: usize = 3;

// ============================================================================
// SHARD LINKS
// ============================================================================

/// How a retrieved hit was used by the response it was delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardUsageType {
    /// The response drew on this memory
    UsedInResponse,
    /// Ranked in the top three but not used - the strongest negative signal
    IgnoredTopHit,
    /// Retrieved at a lower rank and not used
    PartiallyUsed,
}

/// One usage observation, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardLink {
    /// Memory the observation is about
    pub memory_id: String,
    /// Usage classification
    pub usage_type: ShardUsageType,
    /// Blended relevance the hit had at retrieval time
    pub relevance_score: f64,
    /// Zero-based rank the hit was delivered at
    pub rank_position: usize,
    /// Response the hit was delivered to
    pub response_id: String,
    /// User the response was for
    pub user_id: String,
    /// When the observation was recorded
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// WRITEBACK TRACKER
// ============================================================================

/// Append-only log of usage observations
#[derive(Default)]
pub struct WritebackTracker {
    links: RwLock<Vec<ShardLink>>,
}

impl WritebackTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every hit of a response and append the whole batch
    /// atomically. Returns the number of links recorded.
    pub async fn record_usage(
        &self,
        response_id: &str,
        user_id: &str,
        hits: &[ContextHit],
        used_ids: &HashSet<String>,
    ) -> usize {
        let now = Utc::now();
        let batch: Vec<ShardLink> = hits
            .iter()
            .enumerate()
            .map(|(rank, hit)| ShardLink {
                memory_id: hit.id.clone(),
                usage_type: classify(rank, &hit.id, used_ids),
                relevance_score: hit.score,
                rank_position: rank,
                response_id: response_id.to_string(),
                user_id: user_id.to_string(),
                timestamp: now,
            })
            .collect();

        let recorded = batch.len();
        // Single write-lock section keeps the batch atomic and ordered
        self.links.write().await.extend(batch);
        recorded
    }

    /// All links recorded at or after `since`, in append order
    pub async fn links_since(&self, since: DateTime<Utc>) -> Vec<ShardLink> {
        self.links
            .read()
            .await
            .iter()
            .filter(|link| link.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Drop links recorded before `cutoff`; returns how many were
    /// removed. The feedback loop only ever reads a trailing window, so
    /// anything older can be compacted away to bound the log.
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|link| link.timestamp >= cutoff);
        before - links.len()
    }

    /// Total observations retained
    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    /// Whether no observations have been recorded yet
    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }
}

/// Usage classification rule: used beats everything; unused top-three
/// hits are ignored top hits; the rest were merely along for the ride.
fn classify(rank: usize, memory_id: &str, used_ids: &HashSet<String>) -> ShardUsageType {
    if used_ids.contains(memory_id) {
        ShardUsageType::UsedInResponse
    } else if rank < TOP_HIT_RANKS {
        ShardUsageType::IgnoredTopHit
    } else {
        ShardUsageType::PartiallyUsed
    }
}

// ============================================================================
// TESTS
// ============================================================================
