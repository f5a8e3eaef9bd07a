//! Consolidation Engine
//!
//! Periodic job that merges related episodic memories into distilled
//! semantic knowledge:
//!
//! 1. Collect unconsolidated episodic entries from the trailing window
//! 2. Cluster them per (tenant, user) on pairwise embedding similarity
//! 3. Summarize each cluster into a new SEMANTIC entry
//! 4. Link provenance both ways (source_memories / derived_memories)
//!
//! Sources are never deleted; they gain a reflection count and the
//! `consolidated` flag, which makes the job idempotent: a second run
//! with no new episodic data is a no-op. A failure in one cluster is
//! logged and skipped, never aborting the run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::memory::{MemoryEntry, MemoryType};
use crate::policy::MemoryPolicyEngine;
use crate::similarity::cosine_similarity;
use crate::store::{MemoryFilter, MemoryStore, Summarizer, VectorIndex};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for consolidation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsolidationConfig {
    /// Trailing window of episodic candidates, in hours
    pub window_hours: i64,
    /// Pairwise cosine similarity required to join a cluster
    pub similarity_threshold: f32,
    /// Smallest cluster worth summarizing
    pub min_cluster_size: usize,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            similarity_threshold: 0.75,
            min_cluster_size: 2,
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Outcome of one consolidation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationReport {
    /// Clusters summarized and linked successfully
    pub clusters_processed: u64,
    /// Clusters skipped because summarization or linking failed
    pub clusters_failed: u64,
    /// New semantic entries created (equals clusters_processed)
    pub memories_created: u64,
    /// Episodic candidates considered this run
    pub candidates_considered: u64,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
}

// ============================================================================
// CONSOLIDATION ENGINE
// ============================================================================

/// Groups related episodic memories and derives semantic summaries
pub struct ConsolidationEngine {
    store: Arc<dyn MemoryStore>,
    index: Arc<dyn VectorIndex>,
    summarizer: Arc<dyn Summarizer>,
    policy: MemoryPolicyEngine,
    config: ConsolidationConfig,
}

impl ConsolidationEngine {
    /// Create a consolidation engine over the given collaborators
    pub fn new(
        store: Arc<dyn MemoryStore>,
        index: Arc<dyn VectorIndex>,
        summarizer: Arc<dyn Summarizer>,
        policy: MemoryPolicyEngine,
        config: ConsolidationConfig,
    ) -> Self {
        Self {
            store,
            index,
            summarizer,
            policy,
            config,
        }
    }

    /// Run one consolidation pass over the trailing window
    pub async fn consolidate(&self) -> Result<ConsolidationReport> {
        let started = Instant::now();
        let now = Utc::now();

        let filter = MemoryFilter {
            memory_types: Some(vec![MemoryType::Episodic]),
            consolidated: Some(false),
            created_after: Some(now - Duration::hours(self.config.window_hours)),
            ..Default::default()
        };

        let candidates = self.store.scan(&filter).await?;

        let mut report = ConsolidationReport {
            candidates_considered: candidates.len() as u64,
            ..Default::default()
        };

        // Clusters never cross the (tenant, user) boundary
        let mut groups: HashMap<(String, String), Vec<MemoryEntry>> = HashMap::new();
        for entry in candidates {
            groups
                .entry((entry.tenant_id.clone(), entry.user_id.clone()))
                .or_default()
                .push(entry);
        }

        let mut group_keys: Vec<_> = groups.keys().cloned().collect();
        group_keys.sort();

        for key in group_keys {
            let members = groups.remove(&key).unwrap_or_default();
            let clusters = self.cluster(&members).await;

            for cluster in clusters {
                match self.derive_semantic(&key.0, &key.1, &cluster).await {
                    Ok(()) => {
                        report.clusters_processed += 1;
                        report.memories_created += 1;
                    }
                    Err(err) => {
                        report.clusters_failed += 1;
                        tracing::warn!(
                            tenant_id = %key.0,
                            user_id = %key.1,
                            cluster_size = cluster.len(),
                            error = %err,
                            "cluster consolidation failed, skipping"
                        );
                    }
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            clusters_processed = report.clusters_processed,
            clusters_failed = report.clusters_failed,
            candidates = report.candidates_considered,
            "consolidation run finished"
        );
        Ok(report)
    }

    /// Greedy single-link clustering on pairwise cosine similarity.
    /// Entries without a stored vector cannot be clustered and stay
    /// unconsolidated for future runs.
    async fn cluster(&self, members: &[MemoryEntry]) -> Vec<Vec<MemoryEntry>> {
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(members.len());
        for entry in members {
            vectors.push(self.index.fetch(&entry.id).await.ok().flatten());
        }

        let mut assigned = vec![false; members.len()];
        let mut clusters = Vec::new();

        for seed in 0..members.len() {
            if assigned[seed] {
                continue;
            }
            let Some(seed_vector) = &vectors[seed] else {
                continue;
            };

            let mut cluster_indices = vec![seed];
            for other in (seed + 1)..members.len() {
                if assigned[other] {
                    continue;
                }
                let Some(other_vector) = &vectors[other] else {
                    continue;
                };
                if cosine_similarity(seed_vector, other_vector)
                    >= self.config.similarity_threshold
                {
                    cluster_indices.push(other);
                }
            }

            if cluster_indices.len() >= self.config.min_cluster_size {
                for &i in &cluster_indices {
                    assigned[i] = true;
                }
                clusters.push(cluster_indices.iter().map(|&i| members[i].clone()).collect());
            }
        }

        clusters
    }

    /// Summarize one cluster into a semantic entry and link provenance
    async fn derive_semantic(
        &self,
        tenant_id: &str,
        user_id: &str,
        cluster: &[MemoryEntry],
    ) -> Result<()> {
        let texts: Vec<String> = cluster.iter().map(|e| e.content.clone()).collect();
        let summary = self.summarizer.summarize(&texts).await?;

        let importance = cluster
            .iter()
            .map(|e| e.importance_score)
            .fold(0.0_f64, f64::max);
        let tier = self.policy.assign_decay_tier(importance);
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let derived = MemoryEntry {
            id: id.clone(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            content: summary,
            memory_type: MemoryType::Semantic,
            importance_score: importance,
            decay_tier: tier,
            created_at: now,
            last_accessed_at: now,
            expires_at: self.policy.calculate_expiry(tier, now),
            access_count: 0,
            reflection_count: 0,
            consolidated: false,
            archived: false,
            source_memories: cluster.iter().map(|e| e.id.clone()).collect(),
            derived_memories: vec![],
            procedural: None,
            conversation_id: None,
            emotional_valence: None,
            metadata: HashMap::new(),
        };

        self.store.put(derived).await?;

        // Centroid of the source vectors stands in for the summary's
        // embedding so the new entry is immediately searchable.
        if let Some(centroid) = self.centroid(cluster).await {
            self.index.upsert(&id, &centroid).await?;
        }

        // Sources keep living; they only gain provenance bookkeeping
        for source in cluster {
            if let Some(mut entry) = self.store.get(&source.id).await? {
                entry.reflection_count += 1;
                entry.consolidated = true;
                entry.derived_memories.push(id.clone());
                self.store.put(entry).await?;
            }
        }

        Ok(())
    }

    async fn centroid(&self, cluster: &[MemoryEntry]) -> Option<Vec<f32>> {
        let mut sum: Option<Vec<f32>> = None;
        let mut count = 0usize;
        for entry in cluster {
            if let Ok(Some(vector)) = self.index.fetch(&entry.id).await {
                match &mut sum {
                    None => sum = Some(vector),
                    Some(acc) if acc.len() == vector.len() => {
                        for (a, v) in acc.iter_mut().zip(vector.iter()) {
                            *a += v;
                        }
                    }
                    _ => continue,
                }
                count += 1;
            }
        }
        let mut centroid = sum?;
        if count > 1 {
            for value in centroid.iter_mut() {
                *value /= count as f32;
            }
        }
        Some(centroid)
    }
}

// ============================================================================
// TESTS
// ============================================================================
