//! Journey: the vector index goes down, retrieval keeps answering
//!
//! With the index offline the ranker falls back to metadata-only
//! scoring (importance + recency, renormalized). Results carry no
//! similarity and the response is flagged degraded, never failed.

use engram_e2e_tests::harness::{axis, TestEngine};

#[tokio::test]
async fn index_outage_degrades_instead_of_failing() {
    let engine = TestEngine::new();
    let critical = engine.commit("critical runbook step", 9.0, axis(4, 0)).await;
    let trivial = engine.commit("offhand remark", 2.0, axis(4, 1)).await;

    engine.index.set_unavailable(true);

    let response = engine.query(axis(4, 0), 5).await;
    assert!(response.degraded);
    assert_eq!(response.hits.len(), 2);

    // Without similarity the ordering is importance-driven
    assert_eq!(response.hits[0].id, critical.id);
    assert_eq!(response.hits[1].id, trivial.id);
    assert!(response.hits.iter().all(|hit| hit.similarity.is_none()));

    let stats = engine.service.get_stats().await.unwrap();
    assert_eq!(stats.degraded_queries, 1);
}

#[tokio::test]
async fn recovery_restores_similarity_ranking() {
    let engine = TestEngine::new();
    let exact = engine.commit("exact match", 2.0, axis(4, 0)).await;
    engine.commit("important elsewhere", 9.0, axis(4, 1)).await;

    engine.index.set_unavailable(true);
    let degraded = engine.query(axis(4, 0), 1).await;
    assert!(degraded.degraded);
    // Importance wins while similarity is unavailable
    assert_ne!(degraded.hits[0].id, exact.id);

    engine.index.set_unavailable(false);
    let healthy = engine.query(axis(4, 0), 1).await;
    assert!(!healthy.degraded);
    // Similarity dominates again once the index is back
    assert_eq!(healthy.hits[0].id, exact.id);
    assert!(healthy.hits[0].similarity.is_some());
}

#[tokio::test]
async fn degraded_mode_respects_scope_and_expiry() {
    let engine = TestEngine::new();
    let live = engine.commit("live entry", 7.0, axis(4, 0)).await;
    let expired = engine.commit("expired entry", 2.0, axis(4, 1)).await;
    engine.backdate(&expired.id, 8).await;

    engine.index.set_unavailable(true);
    let response = engine.query(axis(4, 0), 5).await;

    assert!(response.degraded);
    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].id, live.id);
}
