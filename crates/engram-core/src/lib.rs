//! # Engram Core
//!
//! Tri-partite memory lifecycle engine for AI agents. Manages the full
//! life of a memory, from commit to purge:
//!
//! - **Tri-partite model**: episodic / procedural / semantic memories
//! - **Decay tiers**: importance-derived retention (short / medium / long)
//! - **Blended retrieval**: similarity + importance + recency ranking,
//!   with a metadata-only degraded mode when the vector index is down
//! - **Consolidation**: clusters related episodic memories into distilled
//!   semantic knowledge with two-way provenance links
//! - **Two-phase eviction**: soft archival before hard deletion
//! - **Usage writeback**: records which retrieved memories responses
//!   actually used, and adapts tiers and importance from that signal
//!
//! Storage, vector search, and summarization are injected behind traits;
//! the crate ships in-memory reference adapters for tests and local use.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use engram_core::{
//!     CommitRequest, EngineConfig, InMemoryStore, InMemoryVectorIndex,
//!     JoiningSummarizer, MemoryService, QueryRequest,
//! };
//!
//! let service = MemoryService::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(InMemoryVectorIndex::new()),
//!     Arc::new(JoiningSummarizer::new()),
//!     EngineConfig::default(),
//! );
//!
//! // Commit a memory; the policy engine assigns its decay tier
//! let receipt = service.commit(CommitRequest {
//!     tenant_id: "acme".into(),
//!     user_id: "u1".into(),
//!     content: "User prefers terse answers".into(),
//!     importance_score: 8.5,
//!     embedding: Some(embedding),
//!     ..Default::default()
//! }).await?;
//!
//! // Retrieve ranked context
//! let response = service.query(&QueryRequest {
//!     tenant_id: "acme".into(),
//!     user_id: "u1".into(),
//!     embedding: query_embedding,
//!     ..Default::default()
//! }).await?;
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod consolidation;
pub mod decay;
pub mod error;
pub mod feedback;
pub mod memory;
pub mod policy;
pub mod retrieval;
pub mod service;
pub mod similarity;
pub mod store;
pub mod writeback;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{
    recency_label, CommitReceipt, CommitRequest, ContextHit, DecayTier, MemoryEntry, MemoryType,
    MemoryUsageStats, ProceduralProfile, QueryRequest, QueryResponse,
};

// Errors
pub use error::{EngineError, Result};

// Policy engine
pub use policy::{
    AdjustmentDirection, AdjustmentRecommendation, MemoryPolicyEngine, PolicyConfig,
};

// Retrieval
pub use retrieval::{RankerConfig, RetrievalRanker};

// Consolidation
pub use consolidation::{ConsolidationConfig, ConsolidationEngine, ConsolidationReport};

// Decay eviction
pub use decay::{DecayConfig, DecayEvictor, DecayReport};

// Writeback and feedback
pub use feedback::{
    AdaptivePolicyAdjuster, AdjustmentReport, FeedbackAnalyzer, FeedbackMetrics,
};
pub use writeback::{ShardLink, ShardUsageType, WritebackTracker};

// Storage seams and reference adapters
pub use store::{
    InMemoryStore, InMemoryVectorIndex, JoiningSummarizer, MemoryFilter, MemoryStore, ScoredId,
    Summarizer, VectorIndex,
};

// Service facade
pub use config::{EngineConfig, FeedbackConfig, SchedulerConfig};
pub use service::{EngineStats, LifecycleScheduler, MemoryService};

// Similarity primitive
pub use similarity::cosine_similarity;
