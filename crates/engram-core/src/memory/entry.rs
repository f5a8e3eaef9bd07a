//! Memory Entry - The unit of memory
//!
//! Each entry represents one remembered piece of content with:
//! - Tri-partite classification (episodic / procedural / semantic)
//! - Policy-derived decay tier and expiry
//! - Access and consolidation bookkeeping
//! - Provenance links for consolidated knowledge

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// MEMORY TYPES
// ============================================================================

/// Tri-partite memory classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Conversational events and specific moments
    #[default]
    Episodic,
    /// Learned action patterns (tool usage, success rates)
    Procedural,
    /// Distilled knowledge, usually derived by consolidation
    Semantic,
}

impl MemoryType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Episodic => "episodic",
            MemoryType::Procedural => "procedural",
            MemoryType::Semantic => "semantic",
        }
    }

    /// Parse from string name, defaulting to episodic
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "procedural" => MemoryType::Procedural,
            "semantic" => MemoryType::Semantic,
            _ => MemoryType::Episodic,
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DECAY TIERS
// ============================================================================

/// Retention tier, derived from importance by the policy engine.
///
/// Callers never set this directly; it changes only through commit-time
/// assignment and the adaptive policy adjuster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecayTier {
    /// Short retention, fastest decay
    #[default]
    Short,
    /// Medium retention
    Medium,
    /// Long retention, near-zero decay
    Long,
}

impl DecayTier {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DecayTier::Short => "short",
            DecayTier::Medium => "medium",
            DecayTier::Long => "long",
        }
    }

    /// Parse from string name, defaulting to short
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "medium" => DecayTier::Medium,
            "long" => DecayTier::Long,
            _ => DecayTier::Short,
        }
    }

    /// The next tier up, saturating at long
    pub fn promoted(&self) -> DecayTier {
        match self {
            DecayTier::Short => DecayTier::Medium,
            DecayTier::Medium | DecayTier::Long => DecayTier::Long,
        }
    }

    /// The next tier down, saturating at short
    pub fn demoted(&self) -> DecayTier {
        match self {
            DecayTier::Long => DecayTier::Medium,
            DecayTier::Medium | DecayTier::Short => DecayTier::Short,
        }
    }

    /// All tiers, shortest retention first
    pub fn all() -> [DecayTier; 3] {
        [DecayTier::Short, DecayTier::Medium, DecayTier::Long]
    }
}

impl std::fmt::Display for DecayTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// PROCEDURAL PROFILE
// ============================================================================

/// Procedural-only fields tracking learned tool behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProceduralProfile {
    /// Tool this pattern was learned from
    pub tool_name: String,
    /// Observed success rate, 0.0 to 1.0
    pub success_rate: f64,
    /// Number of tool invocations observed
    pub usage_count: u64,
}

// ============================================================================
// MEMORY ENTRY
// ============================================================================

/// A memory entry - the unit the whole lifecycle operates on
///
/// Lifecycle: created by commit; mutated by retrieval (access
/// bookkeeping), consolidation (reflection/derivation links), the
/// adaptive policy adjuster (tier/importance), and the decay evictor
/// (archive, then purge - terminal).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    /// Unique identifier (UUID v4), immutable
    pub id: String,
    /// Tenant scope; every operation filters on this
    pub tenant_id: String,
    /// User scope within the tenant
    pub user_id: String,
    /// The remembered content
    pub content: String,
    /// Tri-partite classification
    pub memory_type: MemoryType,
    /// Importance, 0.0 to 10.0; adjustable only through the policy adjuster
    pub importance_score: f64,
    /// Retention tier derived from importance
    pub decay_tier: DecayTier,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry was last returned by retrieval
    pub last_accessed_at: DateTime<Utc>,
    /// Hard expiry: created_at + tier retention
    pub expires_at: DateTime<Utc>,
    /// Monotonic count of retrieval hits
    pub access_count: u64,
    /// Times this entry served as a consolidation source
    pub reflection_count: u32,
    /// Whether this entry already fed a consolidation run
    pub consolidated: bool,
    /// Soft-archived: excluded from retrieval, not yet purged
    pub archived: bool,
    /// Ids this entry was derived from (non-empty only for semantic)
    #[serde(default)]
    pub source_memories: Vec<String>,
    /// Ids derived from this entry
    #[serde(default)]
    pub derived_memories: Vec<String>,
    /// Procedural-only tool profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedural: Option<ProceduralProfile>,
    /// Conversation this entry came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Emotional valence, -1.0 (negative) to 1.0 (positive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotional_valence: Option<f64>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl MemoryEntry {
    /// Whether the entry is past its hard expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the entry may be returned by retrieval at `now`
    pub fn is_retrievable_at(&self, now: DateTime<Utc>) -> bool {
        !self.archived && !self.is_expired_at(now)
    }

    /// Age in fractional hours at `now` (never negative)
    pub fn age_hours_at(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.created_at).num_seconds().max(0)) as f64 / 3600.0
    }

    /// Hours since the last retrieval hit at `now` (never negative)
    pub fn idle_hours_at(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.last_accessed_at).num_seconds().max(0)) as f64 / 3600.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
