//! Journey: episodic memories consolidate into semantic knowledge
//!
//! Related episodic entries from the trailing window cluster together,
//! get summarized into one semantic entry with two-way provenance, and
//! are never consumed in the process. The run is idempotent and a
//! summarizer outage only skips the affected cluster.

use engram_e2e_tests::harness::{axis, near_axis, TestEngine};
use engram_core::{MemoryFilter, MemoryStore, MemoryType};

async fn semantic_entries(engine: &TestEngine) -> Vec<engram_core::MemoryEntry> {
    engine
        .store
        .scan(&MemoryFilter::scoped("acme", "u1"))
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.memory_type == MemoryType::Semantic)
        .collect()
}

#[tokio::test]
async fn related_episodics_consolidate_with_provenance() {
    let engine = TestEngine::new();

    let a = engine.commit("asked about borrow checker", 3.0, near_axis(4, 0, 0.05)).await;
    let b = engine.commit("asked about lifetimes", 4.0, near_axis(4, 0, 0.08)).await;
    let c = engine.commit("asked about ownership", 6.0, near_axis(4, 0, 0.02)).await;
    let unrelated = engine.commit("ordered a pizza", 5.0, axis(4, 1)).await;

    let report = engine.service.run_consolidation().await.unwrap();
    assert_eq!(report.candidates_considered, 4);
    assert_eq!(report.clusters_processed, 1);
    assert_eq!(report.memories_created, 1);
    assert_eq!(report.clusters_failed, 0);

    let semantics = semantic_entries(&engine).await;
    assert_eq!(semantics.len(), 1);
    let semantic = &semantics[0];

    // Importance inherits the strongest source; tier follows policy
    assert_eq!(semantic.importance_score, 6.0);
    let mut sources = semantic.source_memories.clone();
    sources.sort();
    let mut expected = vec![a.id.clone(), b.id.clone(), c.id.clone()];
    expected.sort();
    assert_eq!(sources, expected);

    // Sources survive, flagged and linked back
    for id in [&a.id, &b.id, &c.id] {
        let source = engine.store.get(id).await.unwrap().unwrap();
        assert!(source.consolidated);
        assert_eq!(source.reflection_count, 1);
        assert_eq!(source.derived_memories, vec![semantic.id.clone()]);
    }

    // The outsider was considered but never touched
    let outsider = engine.store.get(&unrelated.id).await.unwrap().unwrap();
    assert!(!outsider.consolidated);
    assert!(outsider.derived_memories.is_empty());
}

#[tokio::test]
async fn consolidation_is_idempotent() {
    let engine = TestEngine::new();
    engine.commit("note one", 3.0, near_axis(4, 0, 0.05)).await;
    engine.commit("note two", 3.0, near_axis(4, 0, 0.03)).await;

    let first = engine.service.run_consolidation().await.unwrap();
    assert_eq!(first.memories_created, 1);

    // Nothing new to fold in: the second run is a no-op
    let second = engine.service.run_consolidation().await.unwrap();
    assert_eq!(second.clusters_processed, 0);
    assert_eq!(second.memories_created, 0);

    assert_eq!(semantic_entries(&engine).await.len(), 1);
}

#[tokio::test]
async fn consolidated_knowledge_is_retrievable() {
    let engine = TestEngine::new();
    engine.commit("likes espresso", 4.0, near_axis(4, 2, 0.05)).await;
    engine.commit("likes ristretto", 5.0, near_axis(4, 2, 0.07)).await;

    engine.service.run_consolidation().await.unwrap();
    let semantic = semantic_entries(&engine).await.remove(0);

    // The centroid vector makes the summary reachable by similarity
    let response = engine.query(axis(4, 2), 5).await;
    assert!(response.hits.iter().any(|hit| hit.id == semantic.id));
}

#[tokio::test]
async fn summarizer_outage_leaves_sources_retryable() {
    let engine = TestEngine::new();
    let a = engine.commit("first note", 3.0, near_axis(4, 0, 0.05)).await;
    let b = engine.commit("second note", 3.0, near_axis(4, 0, 0.03)).await;

    engine.summarizer.set_unavailable(true);
    let report = engine.service.run_consolidation().await.unwrap();
    assert_eq!(report.clusters_failed, 1);
    assert_eq!(report.memories_created, 0);

    // Sources stay unconsolidated, so the next healthy run picks them up
    for id in [&a.id, &b.id] {
        assert!(!engine.store.get(id).await.unwrap().unwrap().consolidated);
    }

    engine.summarizer.set_unavailable(false);
    let retry = engine.service.run_consolidation().await.unwrap();
    assert_eq!(retry.memories_created, 1);
}
