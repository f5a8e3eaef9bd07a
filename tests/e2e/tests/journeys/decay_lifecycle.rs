//! Journey: decay from commit to purge
//!
//! Expired entries vanish from retrieval immediately, get archived and
//! purged by the next decay cycle; merely idle entries are archived but
//! kept until their retention actually runs out.

use engram_e2e_tests::harness::{axis, TestEngine};
use engram_core::{MemoryStore, VectorIndex};

#[tokio::test]
async fn expired_entry_is_archived_and_purged_in_one_cycle() {
    let engine = TestEngine::new();

    // Short-tier entry, then simulate 8 days passing on a 7-day retention
    let receipt = engine.commit("ephemeral note", 2.0, axis(4, 0)).await;
    engine.backdate(&receipt.id, 8).await;

    // Expired entries are unretrievable even before any decay cycle runs
    let response = engine.query(axis(4, 0), 5).await;
    assert!(response.hits.iter().all(|hit| hit.id != receipt.id));

    let report = engine.service.run_decay_cycle().await.unwrap();
    assert_eq!(report.archived, 1);
    assert_eq!(report.purged, 1);

    assert!(engine.store.get(&receipt.id).await.unwrap().is_none());
    assert!(engine.index.fetch(&receipt.id).await.unwrap().is_none());
}

#[tokio::test]
async fn fresh_commit_survives_an_interleaved_decay_cycle() {
    let engine = TestEngine::new();
    // Low importance, committed just now: in policy, must stay visible
    let receipt = engine.commit("minor aside", 0.4, axis(4, 0)).await;

    let report = engine.service.run_decay_cycle().await.unwrap();
    assert_eq!(report.archived, 0);

    let response = engine.query(axis(4, 0), 1).await;
    assert_eq!(response.hits[0].id, receipt.id);
}

#[tokio::test]
async fn idle_entry_is_archived_but_kept_until_expiry() {
    let engine = TestEngine::new();

    // Low importance, 5 idle days: decay score ~0.03, under the threshold,
    // but the 7-day retention has not run out yet
    let receipt = engine.commit("barely important", 1.0, axis(4, 1)).await;
    engine.backdate(&receipt.id, 5).await;

    let report = engine.service.run_decay_cycle().await.unwrap();
    assert_eq!(report.archived, 1);
    assert_eq!(report.purged, 0);

    let entry = engine.store.get(&receipt.id).await.unwrap().unwrap();
    assert!(entry.archived);

    // Archived entries never surface in retrieval
    let response = engine.query(axis(4, 1), 5).await;
    assert!(response.hits.iter().all(|hit| hit.id != receipt.id));

    let stats = engine.service.get_stats().await.unwrap();
    assert_eq!(stats.archived, 1);
    assert_eq!(stats.total_memories, 1);
}

#[tokio::test]
async fn important_entries_survive_the_cycle() {
    let engine = TestEngine::new();

    let keeper = engine.commit("core user preference", 9.0, axis(4, 2)).await;
    // Half a year of idleness on the long tier barely dents the score
    engine.backdate(&keeper.id, 180).await;

    let report = engine.service.run_decay_cycle().await.unwrap();
    assert_eq!(report.archived, 0);
    assert_eq!(report.purged, 0);

    let response = engine.query(axis(4, 2), 1).await;
    assert_eq!(response.hits[0].id, keeper.id);
}

#[tokio::test]
async fn mixed_population_full_cycle() {
    let engine = TestEngine::new();

    let expired = engine.commit("expired", 2.0, axis(4, 0)).await;
    engine.backdate(&expired.id, 8).await;

    let idle = engine.commit("idle", 1.0, axis(4, 1)).await;
    engine.backdate(&idle.id, 5).await;

    let fresh = engine.commit("fresh", 5.0, axis(4, 2)).await;
    let keeper = engine.commit("keeper", 9.0, axis(4, 3)).await;

    let report = engine.service.run_decay_cycle().await.unwrap();
    assert_eq!(report.archived, 2);
    assert_eq!(report.purged, 1);
    assert_eq!(report.failed, 0);

    assert!(engine.store.get(&expired.id).await.unwrap().is_none());
    assert!(engine.store.get(&idle.id).await.unwrap().unwrap().archived);
    assert!(!engine.store.get(&fresh.id).await.unwrap().unwrap().archived);
    assert!(!engine.store.get(&keeper.id).await.unwrap().unwrap().archived);
}
