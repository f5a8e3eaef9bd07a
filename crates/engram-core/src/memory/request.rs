//! Request and response types for the engine's exposed operations
//!
//! Embedding generation is an external collaborator: requests carry
//! pre-computed vectors, never raw model handles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{DecayTier, MemoryType, ProceduralProfile};

// ============================================================================
// COMMIT
// ============================================================================

/// Input for committing a new memory
///
/// Uses `deny_unknown_fields` to prevent field injection attacks.
/// Note the absence of a decay tier field: tiers are policy-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommitRequest {
    /// Tenant scope
    pub tenant_id: String,
    /// User scope
    pub user_id: String,
    /// Content to remember
    pub content: String,
    /// Tri-partite classification
    #[serde(default)]
    pub memory_type: MemoryType,
    /// Importance, 0.0 to 10.0 (rejected outside the range, not clamped)
    pub importance_score: f64,
    /// Pre-computed embedding for the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Procedural-only tool profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedural: Option<ProceduralProfile>,
    /// Conversation this content came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Emotional valence, -1.0 to 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotional_valence: Option<f64>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Default for CommitRequest {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            user_id: String::new(),
            content: String::new(),
            memory_type: MemoryType::Episodic,
            importance_score: 5.0,
            embedding: None,
            procedural: None,
            conversation_id: None,
            emotional_valence: None,
            metadata: HashMap::new(),
        }
    }
}

/// What commit returns to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    /// Id of the stored entry
    pub id: String,
    /// Tier the policy engine assigned
    pub decay_tier: DecayTier,
    /// Hard expiry derived from the tier
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// QUERY
// ============================================================================

/// Input for querying memories
///
/// Uses `deny_unknown_fields` to prevent field injection attacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryRequest {
    /// Tenant scope
    pub tenant_id: String,
    /// User scope
    pub user_id: String,
    /// Pre-computed embedding of the query text
    pub embedding: Vec<f32>,
    /// Restrict to these memory types (None = all)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_types: Option<Vec<MemoryType>>,
    /// Only entries created within the trailing window, in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_window_hours: Option<i64>,
    /// Maximum hits to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum blended relevance; overrides the configured default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_relevance: Option<f64>,
}

fn default_top_k() -> usize {
    8
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            user_id: String::new(),
            embedding: vec![],
            memory_types: None,
            temporal_window_hours: None,
            top_k: default_top_k(),
            min_relevance: None,
        }
    }
}

/// A single retrieved memory, scored and ranked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextHit {
    /// Id of the memory entry
    pub id: String,
    /// Remembered content
    pub content: String,
    /// Tri-partite classification
    pub memory_type: MemoryType,
    /// Retention tier at retrieval time
    pub decay_tier: DecayTier,
    /// Importance at retrieval time
    pub importance_score: f64,
    /// Blended relevance score the hit was ranked by
    pub score: f64,
    /// Raw vector similarity; None in degraded mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// Human-readable recency ("today", "3 days ago", ...)
    pub recency: String,
}

/// Result of a query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Ranked hits, best first, at most `top_k`
    pub hits: Vec<ContextHit>,
    /// Candidates considered before relevance filtering
    pub total_candidates: usize,
    /// True when the vector index was unavailable and ranking fell back
    /// to importance + recency only
    pub degraded: bool,
}

// ============================================================================
// RECENCY LABELS
// ============================================================================

/// Human-readable recency label for a creation timestamp
pub fn recency_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - created_at).num_days().max(0);
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => format!("{} months ago", days / 30),
    }
}

// ============================================================================
// TESTS
// ============================================================================
