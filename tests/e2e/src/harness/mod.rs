//! Test engine harness
//!
//! Wires a `MemoryService` over the in-memory reference adapters and
//! keeps direct handles to them so journeys can backdate entries and
//! toggle dependency failures.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use engram_core::{
    CommitReceipt, CommitRequest, EngineConfig, InMemoryStore, InMemoryVectorIndex,
    JoiningSummarizer, MemoryService, MemoryStore, MemoryType, QueryRequest, QueryResponse,
    Summarizer, VectorIndex,
};

/// Tenant every journey runs under
pub const TENANT: &str = "acme";
/// User every journey runs under unless stated otherwise
pub const USER: &str = "u1";

/// A fully wired engine with handles into its backends
pub struct TestEngine {
    pub store: Arc<InMemoryStore>,
    pub index: Arc<InMemoryVectorIndex>,
    pub summarizer: Arc<JoiningSummarizer>,
    pub service: Arc<MemoryService>,
}

impl TestEngine {
    /// Engine with the stock configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with a custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let index = Arc::new(InMemoryVectorIndex::new());
        let summarizer = Arc::new(JoiningSummarizer::new());
        let service = Arc::new(MemoryService::new(
            Arc::clone(&store) as Arc<dyn MemoryStore>,
            Arc::clone(&index) as Arc<dyn VectorIndex>,
            Arc::clone(&summarizer) as Arc<dyn Summarizer>,
            config,
        ));
        Self {
            store,
            index,
            summarizer,
            service,
        }
    }

    /// Commit an episodic memory with an embedding
    pub async fn commit(&self, content: &str, importance: f64, vector: Vec<f32>) -> CommitReceipt {
        self.commit_typed(content, importance, vector, MemoryType::Episodic)
            .await
    }

    /// Commit with an explicit memory type
    pub async fn commit_typed(
        &self,
        content: &str,
        importance: f64,
        vector: Vec<f32>,
        memory_type: MemoryType,
    ) -> CommitReceipt {
        self.service
            .commit(CommitRequest {
                tenant_id: TENANT.into(),
                user_id: USER.into(),
                content: content.into(),
                memory_type,
                importance_score: importance,
                embedding: Some(vector),
                ..Default::default()
            })
            .await
            .expect("commit failed")
    }

    /// Query with a vector and a hit limit
    pub async fn query(&self, vector: Vec<f32>, top_k: usize) -> QueryResponse {
        self.service
            .query(&QueryRequest {
                tenant_id: TENANT.into(),
                user_id: USER.into(),
                embedding: vector,
                top_k,
                ..Default::default()
            })
            .await
            .expect("query failed")
    }

    /// Record a response that used exactly the given hit ids
    pub async fn record(&self, response_id: &str, response: &QueryResponse, used: &[&str]) {
        let used_ids: HashSet<String> = used.iter().map(|s| s.to_string()).collect();
        self.service
            .record_usage(response_id, USER, &response.hits, &used_ids)
            .await;
    }

    /// Shift an entry's creation back in time, keeping its expiry
    /// anchored on the shifted creation. Simulates the passage of time
    /// without a clock abstraction.
    pub async fn backdate(&self, id: &str, days: i64) {
        let mut entry = self
            .store
            .get(id)
            .await
            .expect("store read failed")
            .expect("entry missing");
        let shift = Duration::days(days);
        entry.created_at -= shift;
        entry.last_accessed_at -= shift;
        entry.expires_at -= shift;
        self.store.put(entry).await.expect("store write failed");
    }

    /// Hours since an entry was created (sanity checks)
    pub async fn age_hours(&self, id: &str) -> f64 {
        let entry = self
            .store
            .get(id)
            .await
            .expect("store read failed")
            .expect("entry missing");
        entry.age_hours_at(Utc::now())
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit vector along one axis of a small embedding space
pub fn axis(dimensions: usize, index: usize) -> Vec<f32> {
    let mut vector = vec![0.0; dimensions];
    vector[index] = 1.0;
    vector
}

/// A vector close to (but not exactly) the given axis
pub fn near_axis(dimensions: usize, index: usize, noise: f32) -> Vec<f32> {
    let mut vector = vec![noise; dimensions];
    vector[index] = 1.0;
    vector
}
