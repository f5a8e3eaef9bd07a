//! Retrieval Ranker
//!
//! Blends three signals into one relevance score:
//!
//! ```text
//! score = w1 * similarity
//!       + w2 * (importance / 10)
//!       + w3 * exp(-lambda * age_hours)
//! ```
//!
//! Candidates come from the vector index (overfetched), are filtered by
//! scope and hard expiry store-side, cut at `min_relevance`, and sorted
//! deterministically. When the index is down the ranker degrades to
//! metadata-only scoring instead of failing the request.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::memory::{
    recency_label, ContextHit, DecayTier, MemoryEntry, QueryRequest, QueryResponse,
};
use crate::store::{MemoryFilter, MemoryStore, VectorIndex};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Weights and thresholds for relevance scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankerConfig {
    /// Weight of vector similarity
    pub similarity_weight: f64,
    /// Weight of normalized importance
    pub importance_weight: f64,
    /// Weight of the exponential recency term
    pub recency_weight: f64,
    /// Hits below this blended score are dropped
    pub min_relevance: f64,
    /// ANN candidates fetched per requested hit
    pub overfetch_factor: usize,
    /// Recency decay per hour for short-tier entries
    pub short_decay_lambda: f64,
    /// Recency decay per hour for medium-tier entries
    pub medium_decay_lambda: f64,
    /// Recency decay per hour for long-tier entries
    pub long_decay_lambda: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.6,
            importance_weight: 0.25,
            recency_weight: 0.15,
            min_relevance: 0.3,
            overfetch_factor: 4,
            short_decay_lambda: 0.01,
            medium_decay_lambda: 0.002,
            long_decay_lambda: 0.0001,
        }
    }
}

impl RankerConfig {
    /// Per-tier recency decay constant (short decays fastest)
    pub fn decay_lambda(&self, tier: DecayTier) -> f64 {
        match tier {
            DecayTier::Short => self.short_decay_lambda,
            DecayTier::Medium => self.medium_decay_lambda,
            DecayTier::Long => self.long_decay_lambda,
        }
    }
}

// ============================================================================
// RETRIEVAL RANKER
// ============================================================================

/// Ranks memory entries for a query against the vector index and store
pub struct RetrievalRanker {
    store: Arc<dyn MemoryStore>,
    index: Arc<dyn VectorIndex>,
    config: RankerConfig,
}

impl RetrievalRanker {
    /// Create a ranker over the given collaborators
    pub fn new(
        store: Arc<dyn MemoryStore>,
        index: Arc<dyn VectorIndex>,
        config: RankerConfig,
    ) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Run a query: candidate generation, filtering, scoring, ranking,
    /// and best-effort access bookkeeping on returned hits.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        if request.tenant_id.is_empty() || request.user_id.is_empty() {
            return Err(EngineError::Validation(
                "tenant_id and user_id are required".into(),
            ));
        }
        if request.top_k == 0 {
            return Ok(QueryResponse {
                hits: vec![],
                total_candidates: 0,
                degraded: false,
            });
        }

        let now = Utc::now();
        let filter = self.build_filter(request, now);

        let k = request.top_k * self.config.overfetch_factor.max(1);
        let (candidates, degraded) = match self.index.search(&request.embedding, k).await {
            Ok(scored) => {
                let mut candidates = Vec::with_capacity(scored.len());
                for hit in scored {
                    if let Some(entry) = self.store.get(&hit.id).await? {
                        if filter.matches(&entry, now) {
                            candidates.push((entry, Some(hit.similarity)));
                        }
                    }
                }
                (candidates, false)
            }
            Err(err) => {
                // Metadata-only fallback: importance + recency, no failure
                tracing::warn!(error = %err, "vector index unavailable, degrading to metadata ranking");
                let entries = self.store.scan(&filter).await?;
                (entries.into_iter().map(|e| (e, None)).collect(), true)
            }
        };

        let total_candidates = candidates.len();
        let min_relevance = request.min_relevance.unwrap_or(self.config.min_relevance);

        let mut scored: Vec<(MemoryEntry, Option<f32>, f64)> = candidates
            .into_iter()
            .map(|(entry, similarity)| {
                let score = self.score(&entry, similarity, now);
                (entry, similarity, score)
            })
            .filter(|(_, _, score)| *score >= min_relevance)
            .collect();

        // Score desc, then most recently accessed, then id for determinism
        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.last_accessed_at.cmp(&a.0.last_accessed_at))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored.truncate(request.top_k);

        // Access bookkeeping is best-effort and never fails the read
        for (entry, _, _) in &scored {
            if let Err(err) = self.store.record_access(&entry.id, now).await {
                tracing::warn!(memory_id = %entry.id, error = %err, "access bookkeeping failed");
            }
        }

        let hits = scored
            .into_iter()
            .map(|(entry, similarity, score)| ContextHit {
                id: entry.id,
                content: entry.content,
                memory_type: entry.memory_type,
                decay_tier: entry.decay_tier,
                importance_score: entry.importance_score,
                score,
                similarity,
                created_at: entry.created_at,
                recency: recency_label(entry.created_at, now),
            })
            .collect();

        Ok(QueryResponse {
            hits,
            total_candidates,
            degraded,
        })
    }

    fn build_filter(&self, request: &QueryRequest, now: chrono::DateTime<Utc>) -> MemoryFilter {
        let mut filter = MemoryFilter::scoped(&request.tenant_id, &request.user_id);
        filter.memory_types = request.memory_types.clone();
        if let Some(hours) = request.temporal_window_hours {
            filter.created_after = Some(now - chrono::Duration::hours(hours));
        }
        filter
    }

    /// Blended relevance for one entry. With no similarity (degraded
    /// mode) the remaining weights are renormalized so scores stay on
    /// the same scale as the configured `min_relevance`.
    fn score(
        &self,
        entry: &MemoryEntry,
        similarity: Option<f32>,
        now: chrono::DateTime<Utc>,
    ) -> f64 {
        let importance = entry.importance_score / 10.0;
        let lambda = self.config.decay_lambda(entry.decay_tier);
        let recency = (-lambda * entry.age_hours_at(now)).exp();

        match similarity {
            Some(sim) => {
                self.config.similarity_weight * sim as f64
                    + self.config.importance_weight * importance
                    + self.config.recency_weight * recency
            }
            None => {
                let denom = self.config.importance_weight + self.config.recency_weight;
                if denom <= 0.0 {
                    return 0.0;
                }
                (self.config.importance_weight * importance + self.config.recency_weight * recency)
                    / denom
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
