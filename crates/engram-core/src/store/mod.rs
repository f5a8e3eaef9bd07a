//! External collaborator seams
//!
//! The engine owns the lifecycle logic, not the backends. Persistence
//! and nearest-neighbor search live behind narrow async traits so the
//! relational store, the ANN index, and the summarizer can be swapped
//! without touching policy, ranking, or the background jobs.
//!
//! Implementations must serialize mutations to the same entry id
//! internally (single-writer per id) so concurrent access bumps and
//! tier adjustments never lose updates.

mod mem;

pub use mem::{InMemoryStore, InMemoryVectorIndex, JoiningSummarizer};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::memory::{DecayTier, MemoryEntry, MemoryType};

// ============================================================================
// FILTERS
// ============================================================================

/// Filter for metadata scans
///
/// All fields are conjunctive; `None` means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct MemoryFilter {
    /// Restrict to a tenant
    pub tenant_id: Option<String>,
    /// Restrict to a user within the tenant
    pub user_id: Option<String>,
    /// Restrict to these memory types
    pub memory_types: Option<Vec<MemoryType>>,
    /// Only entries created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Only entries with this consolidation flag
    pub consolidated: Option<bool>,
    /// Include soft-archived entries (default false)
    pub include_archived: bool,
    /// Include entries past their hard expiry (default false)
    pub include_expired: bool,
}

impl MemoryFilter {
    /// Filter scoped to a (tenant, user) pair
    pub fn scoped(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Unscoped filter that sees everything, including archived and
    /// expired entries (used by the background jobs and stats)
    pub fn everything() -> Self {
        Self {
            include_archived: true,
            include_expired: true,
            ..Default::default()
        }
    }

    /// Whether an entry passes this filter at `now`
    pub fn matches(&self, entry: &MemoryEntry, now: DateTime<Utc>) -> bool {
        if let Some(tenant_id) = &self.tenant_id {
            if &entry.tenant_id != tenant_id {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &entry.user_id != user_id {
                return false;
            }
        }
        if let Some(types) = &self.memory_types {
            if !types.contains(&entry.memory_type) {
                return false;
            }
        }
        if let Some(cutoff) = self.created_after {
            if entry.created_at < cutoff {
                return false;
            }
        }
        if let Some(consolidated) = self.consolidated {
            if entry.consolidated != consolidated {
                return false;
            }
        }
        if !self.include_archived && entry.archived {
            return false;
        }
        if !self.include_expired && entry.is_expired_at(now) {
            return false;
        }
        true
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// Abstract persistence for memory entry metadata
///
/// The engine only needs CRUD plus a filtered scan and two atomic
/// mutations (access bookkeeping, tier/importance updates).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or replace an entry
    async fn put(&self, entry: MemoryEntry) -> Result<()>;

    /// Fetch an entry by id
    async fn get(&self, id: &str) -> Result<Option<MemoryEntry>>;

    /// Scan entries matching the filter
    async fn scan(&self, filter: &MemoryFilter) -> Result<Vec<MemoryEntry>>;

    /// Hard-delete an entry; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Atomically update tier, importance, and expiry together.
    ///
    /// The only sanctioned way to change `decay_tier` after commit.
    async fn update_tier_and_importance(
        &self,
        id: &str,
        tier: DecayTier,
        importance: f64,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Atomically bump `access_count` and set `last_accessed_at`
    async fn record_access(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Mark an entry soft-archived (or restore it)
    async fn set_archived(&self, id: &str, archived: bool) -> Result<()>;
}

// ============================================================================
// VECTOR INDEX
// ============================================================================

/// One scored id from a nearest-neighbor search
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
    /// Entry id
    pub id: String,
    /// Similarity to the query vector, higher is closer
    pub similarity: f32,
}

/// Abstract nearest-neighbor search over embeddings
///
/// The index is scope-blind: tenant/user/type filters are enforced
/// store-side on the overfetched candidate set.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a vector
    async fn upsert(&self, id: &str, vector: &[f32]) -> Result<()>;

    /// Nearest neighbors of `vector`, best first, at most `k`
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredId>>;

    /// Fetch a stored vector (consolidation uses this for pairwise
    /// similarity without re-embedding)
    async fn fetch(&self, id: &str) -> Result<Option<Vec<f32>>>;

    /// Remove a vector; missing ids are not an error
    async fn remove(&self, id: &str) -> Result<()>;
}

// ============================================================================
// SUMMARIZER
// ============================================================================

/// External summarization collaborator used only by consolidation
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Distill several related texts into one summary
    async fn summarize(&self, texts: &[String]) -> Result<String>;
}

// ============================================================================
// TESTS
// ============================================================================
