//! Memory Service
//!
//! The facade that ties the lifecycle together: commit, query, usage
//! writeback, and the three background operations (consolidation, decay,
//! policy adjustment). Collaborator backends are injected as trait
//! objects; the service itself is `&self` all the way down and safe to
//! share behind an `Arc`.

mod scheduler;

pub use scheduler::LifecycleScheduler;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::consolidation::{ConsolidationEngine, ConsolidationReport};
use crate::decay::{DecayEvictor, DecayReport};
use crate::error::{EngineError, Result};
use crate::feedback::{AdaptivePolicyAdjuster, AdjustmentReport, FeedbackMetrics};
use crate::memory::{
    CommitReceipt, CommitRequest, ContextHit, MemoryEntry, QueryRequest, QueryResponse,
};
use crate::policy::MemoryPolicyEngine;
use crate::retrieval::RetrievalRanker;
use crate::store::{MemoryFilter, MemoryStore, Summarizer, VectorIndex};
use crate::writeback::WritebackTracker;

// ============================================================================
// STATS
// ============================================================================

/// Point-in-time view of the engine's contents and activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    /// Entries currently held, archived included
    pub total_memories: u64,
    /// Entry counts keyed by memory type name
    pub by_type: HashMap<String, u64>,
    /// Entry counts keyed by decay tier name
    pub by_tier: HashMap<String, u64>,
    /// Entries currently soft-archived
    pub archived: u64,
    /// Episodic entries already folded into a semantic summary
    pub consolidated: u64,
    /// Commits accepted since startup
    pub commits: u64,
    /// Queries served since startup
    pub queries: u64,
    /// Queries served in degraded metadata-only mode
    pub degraded_queries: u64,
    /// Usage observations currently retained in the writeback log
    pub usage_links: u64,
    /// Tier promotions applied by the feedback loop since startup
    pub promotions: u64,
    /// Tier demotions applied by the feedback loop since startup
    pub demotions: u64,
    /// Feedback metrics over the configured trailing window
    pub feedback: FeedbackMetrics,
}

// ============================================================================
// MEMORY SERVICE
// ============================================================================

/// Facade over the full memory lifecycle
pub struct MemoryService {
    store: Arc<dyn MemoryStore>,
    index: Arc<dyn VectorIndex>,
    policy: MemoryPolicyEngine,
    ranker: RetrievalRanker,
    consolidation: ConsolidationEngine,
    evictor: DecayEvictor,
    tracker: Arc<WritebackTracker>,
    adjuster: AdaptivePolicyAdjuster,
    feedback_window: Duration,
    commits: AtomicU64,
    queries: AtomicU64,
    degraded_queries: AtomicU64,
    promotions: AtomicU64,
    demotions: AtomicU64,
}

impl MemoryService {
    /// Wire the lifecycle components over the injected backends
    pub fn new(
        store: Arc<dyn MemoryStore>,
        index: Arc<dyn VectorIndex>,
        summarizer: Arc<dyn Summarizer>,
        config: EngineConfig,
    ) -> Self {
        let policy = MemoryPolicyEngine::with_config(config.policy.clone());
        let tracker = Arc::new(WritebackTracker::new());

        let ranker = RetrievalRanker::new(
            Arc::clone(&store),
            Arc::clone(&index),
            config.ranker.clone(),
        );
        let consolidation = ConsolidationEngine::new(
            Arc::clone(&store),
            Arc::clone(&index),
            summarizer,
            policy.clone(),
            config.consolidation.clone(),
        );
        let evictor = DecayEvictor::new(
            Arc::clone(&store),
            Arc::clone(&index),
            config.decay.clone(),
        );
        let adjuster = AdaptivePolicyAdjuster::new(
            Arc::clone(&store),
            Arc::clone(&tracker),
            policy.clone(),
        )
        .with_cooldown(Duration::hours(config.feedback.cooldown_hours));

        Self {
            store,
            index,
            policy,
            ranker,
            consolidation,
            evictor,
            tracker,
            adjuster,
            feedback_window: Duration::hours(config.feedback.window_hours),
            commits: AtomicU64::new(0),
            queries: AtomicU64::new(0),
            degraded_queries: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            demotions: AtomicU64::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Validate, classify and persist a new memory.
    ///
    /// All-or-nothing: if the vector upsert fails after the metadata
    /// write, the metadata write is rolled back and the error surfaces.
    pub async fn commit(&self, request: CommitRequest) -> Result<CommitReceipt> {
        self.validate_commit(&request)?;

        let now = Utc::now();
        let tier = self.policy.assign_decay_tier(request.importance_score);
        let expires_at = self.policy.calculate_expiry(tier, now);
        let id = Uuid::new_v4().to_string();

        let entry = MemoryEntry {
            id: id.clone(),
            tenant_id: request.tenant_id,
            user_id: request.user_id,
            content: request.content,
            memory_type: request.memory_type,
            importance_score: request.importance_score,
            decay_tier: tier,
            created_at: now,
            last_accessed_at: now,
            expires_at,
            access_count: 0,
            reflection_count: 0,
            consolidated: false,
            archived: false,
            source_memories: vec![],
            derived_memories: vec![],
            procedural: request.procedural,
            conversation_id: request.conversation_id,
            emotional_valence: request.emotional_valence,
            metadata: request.metadata,
        };

        self.store.put(entry).await?;

        if let Some(embedding) = &request.embedding {
            if let Err(err) = self.index.upsert(&id, embedding).await {
                // Roll back the metadata write so the commit stays atomic
                if let Err(rollback_err) = self.store.delete(&id).await {
                    tracing::error!(
                        memory_id = %id,
                        error = %rollback_err,
                        "rollback after vector failure also failed"
                    );
                }
                return Err(err);
            }
        }

        self.commits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(memory_id = %id, tier = %tier, "memory committed");

        Ok(CommitReceipt {
            id,
            decay_tier: tier,
            expires_at,
        })
    }

    fn validate_commit(&self, request: &CommitRequest) -> Result<()> {
        if request.tenant_id.is_empty() || request.user_id.is_empty() {
            return Err(EngineError::Validation(
                "tenant_id and user_id are required".into(),
            ));
        }
        if request.content.trim().is_empty() {
            return Err(EngineError::Validation("content must not be empty".into()));
        }
        self.policy.validate_importance(request.importance_score)?;

        if let Some(valence) = request.emotional_valence {
            if !valence.is_finite() || !(-1.0..=1.0).contains(&valence) {
                return Err(EngineError::Validation(format!(
                    "emotional_valence must be within [-1, 1], got {}",
                    valence
                )));
            }
        }
        if let Some(profile) = &request.procedural {
            if !profile.success_rate.is_finite() || !(0.0..=1.0).contains(&profile.success_rate) {
                return Err(EngineError::Validation(format!(
                    "success_rate must be within [0, 1], got {}",
                    profile.success_rate
                )));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query and writeback
    // ------------------------------------------------------------------

    /// Retrieve ranked context for a query
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let response = self.ranker.query(request).await?;
        self.queries.fetch_add(1, Ordering::Relaxed);
        if response.degraded {
            self.degraded_queries.fetch_add(1, Ordering::Relaxed);
        }
        Ok(response)
    }

    /// Record which delivered hits the response actually used
    pub async fn record_usage(
        &self,
        response_id: &str,
        user_id: &str,
        hits: &[ContextHit],
        used_ids: &HashSet<String>,
    ) -> usize {
        self.tracker
            .record_usage(response_id, user_id, hits, used_ids)
            .await
    }

    // ------------------------------------------------------------------
    // Background operations
    // ------------------------------------------------------------------

    /// One consolidation pass: cluster recent episodic memories and
    /// derive semantic summaries
    pub async fn run_consolidation(&self) -> Result<ConsolidationReport> {
        self.consolidation.consolidate().await
    }

    /// One decay cycle: archive the weak, purge the expired
    pub async fn run_decay_cycle(&self) -> Result<DecayReport> {
        self.evictor.run_cycle().await
    }

    /// One feedback pass: apply usage-derived tier adjustments
    pub async fn adjust_policy(&self) -> Result<AdjustmentReport> {
        let report = self.adjuster.adjust_policy(self.feedback_window).await?;
        self.promotions.fetch_add(report.promoted, Ordering::Relaxed);
        self.demotions.fetch_add(report.demoted, Ordering::Relaxed);
        Ok(report)
    }

    /// Compact usage observations that have aged out of the feedback
    /// window; returns how many were dropped. Safe to run any time: the
    /// feedback loop never reads past the window.
    pub async fn compact_usage_log(&self) -> usize {
        self.tracker
            .prune_older_than(Utc::now() - self.feedback_window)
            .await
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Snapshot contents and activity counters
    pub async fn get_stats(&self) -> Result<EngineStats> {
        let entries = self.store.scan(&MemoryFilter::everything()).await?;

        let mut stats = EngineStats {
            total_memories: entries.len() as u64,
            commits: self.commits.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            degraded_queries: self.degraded_queries.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            demotions: self.demotions.load(Ordering::Relaxed),
            usage_links: self.tracker.len().await as u64,
            feedback: self.adjuster.metrics(self.feedback_window).await,
            ..Default::default()
        };

        for entry in &entries {
            *stats
                .by_type
                .entry(entry.memory_type.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_tier
                .entry(entry.decay_tier.as_str().to_string())
                .or_insert(0) += 1;
            if entry.archived {
                stats.archived += 1;
            }
            if entry.consolidated {
                stats.consolidated += 1;
            }
        }

        Ok(stats)
    }
}

// ============================================================================
// TESTS
// ============================================================================
