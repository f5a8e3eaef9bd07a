//! In-memory reference adapters
//!
//! Brute-force, lock-based implementations of the collaborator seams.
//! They back the test suites and local single-process deployments;
//! production backends live outside this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{EngineError, Result};
use crate::memory::{DecayTier, MemoryEntry};
use crate::similarity::cosine_similarity;

use super::{MemoryFilter, MemoryStore, ScoredId, Summarizer, VectorIndex};

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// HashMap-backed metadata store
///
/// All mutations happen under a single writer lock, which satisfies the
/// per-id single-writer requirement trivially.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held (tests and stats)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn put(&self, entry: MemoryEntry) -> Result<()> {
        self.entries.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryEntry>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn scan(&self, filter: &MemoryFilter) -> Result<Vec<MemoryEntry>> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        let mut matched: Vec<MemoryEntry> = entries
            .values()
            .filter(|entry| filter.matches(entry, now))
            .cloned()
            .collect();
        // Deterministic scan order
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matched)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn update_tier_and_importance(
        &self,
        id: &str,
        tier: DecayTier,
        importance: f64,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        entry.decay_tier = tier;
        entry.importance_score = importance;
        entry.expires_at = expires_at;
        Ok(())
    }

    async fn record_access(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        entry.access_count += 1;
        entry.last_accessed_at = at;
        Ok(())
    }

    async fn set_archived(&self, id: &str, archived: bool) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        entry.archived = archived;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY VECTOR INDEX
// ============================================================================

/// Brute-force cosine index over a HashMap of vectors
///
/// `fail_searches` flips the index into an unavailable state so tests
/// can exercise the ranker's degraded path.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    fail_searches: AtomicBool,
}

impl InMemoryVectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent searches fail with a dependency error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_searches.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, id: &str, vector: &[f32]) -> Result<()> {
        self.vectors
            .write()
            .await
            .insert(id.to_string(), vector.to_vec());
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredId>> {
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(EngineError::dependency("vector_index", "index offline"));
        }

        let vectors = self.vectors.read().await;
        let mut scored: Vec<ScoredId> = vectors
            .iter()
            .map(|(id, candidate)| ScoredId {
                id: id.clone(),
                similarity: cosine_similarity(vector, candidate),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.vectors.read().await.get(id).cloned())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.vectors.write().await.remove(id);
        Ok(())
    }
}

// ============================================================================
// JOINING SUMMARIZER
// ============================================================================

/// Summarizer stand-in that concatenates its inputs
///
/// Good enough for tests and local mode; a real deployment injects an
/// LLM-backed implementation.
#[derive(Default)]
pub struct JoiningSummarizer {
    fail: AtomicBool,
}

impl JoiningSummarizer {
    /// Create a summarizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail with a dependency error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl Summarizer for JoiningSummarizer {
    async fn summarize(&self, texts: &[String]) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::dependency("summarizer", "summarizer offline"));
        }
        Ok(texts.join(" | "))
    }
}

// ============================================================================
// TESTS
// ============================================================================
