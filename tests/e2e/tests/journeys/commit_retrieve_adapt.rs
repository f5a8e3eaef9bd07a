//! Journey: commit, retrieve, feed usage back, watch the policy adapt
//!
//! A memory the user keeps drawing on gets promoted one tier with a
//! longer retention; a memory that keeps surfacing unused gets demoted.

use engram_e2e_tests::harness::{axis, TestEngine};
use engram_core::{DecayTier, MemoryStore};

#[tokio::test]
async fn heavily_used_memory_is_promoted() {
    let engine = TestEngine::new();
    let receipt = engine
        .commit("prefers metric units", 4.0, axis(4, 0))
        .await;
    assert_eq!(receipt.decay_tier, DecayTier::Short);

    // Six retrievals, all used in the response
    for i in 0..6 {
        let response = engine.query(axis(4, 0), 1).await;
        assert_eq!(response.hits[0].id, receipt.id);
        engine
            .record(&format!("resp-{}", i), &response, &[&receipt.id])
            .await;
    }

    let report = engine.service.adjust_policy().await.unwrap();
    assert_eq!(report.promoted, 1);
    assert_eq!(report.demoted, 0);

    let adjusted = engine.store.get(&receipt.id).await.unwrap().unwrap();
    assert_eq!(adjusted.decay_tier, DecayTier::Medium);
    assert_eq!(adjusted.importance_score, 5.0);
    // Retention widened from 7 to 30 days, anchored on creation
    assert_eq!(
        adjusted.expires_at,
        adjusted.created_at + chrono::Duration::days(30)
    );
    // Retrieval bookkeeping followed along
    assert_eq!(adjusted.access_count, 6);

    let stats = engine.service.get_stats().await.unwrap();
    assert_eq!(stats.promotions, 1);
    assert_eq!(stats.demotions, 0);
}

#[tokio::test]
async fn ignored_top_hit_is_demoted() {
    let engine = TestEngine::new();
    let receipt = engine
        .commit("stale preference nobody wants", 6.0, axis(4, 1))
        .await;
    assert_eq!(receipt.decay_tier, DecayTier::Medium);

    // Ten retrievals at rank zero, never used
    for i in 0..10 {
        let response = engine.query(axis(4, 1), 1).await;
        assert_eq!(response.hits[0].id, receipt.id);
        engine.record(&format!("resp-{}", i), &response, &[]).await;
    }

    let report = engine.service.adjust_policy().await.unwrap();
    assert_eq!(report.demoted, 1);

    let adjusted = engine.store.get(&receipt.id).await.unwrap().unwrap();
    assert_eq!(adjusted.decay_tier, DecayTier::Short);
    assert_eq!(adjusted.importance_score, 5.0);
    assert_eq!(
        adjusted.expires_at,
        adjusted.created_at + chrono::Duration::days(7)
    );
}

#[tokio::test]
async fn second_pass_within_cooldown_changes_nothing() {
    let engine = TestEngine::new();
    let receipt = engine.commit("useful fact", 4.0, axis(4, 0)).await;

    for i in 0..6 {
        let response = engine.query(axis(4, 0), 1).await;
        engine
            .record(&format!("resp-{}", i), &response, &[&receipt.id])
            .await;
    }

    let first = engine.service.adjust_policy().await.unwrap();
    assert_eq!(first.promoted, 1);

    // Same window, immediate re-run: the 24h cooldown holds the line
    let second = engine.service.adjust_policy().await.unwrap();
    assert_eq!(second.promoted, 0);
    assert_eq!(second.skipped_cooldown, 1);

    let entry = engine.store.get(&receipt.id).await.unwrap().unwrap();
    assert_eq!(entry.decay_tier, DecayTier::Medium);
}

#[tokio::test]
async fn mixed_usage_in_middle_band_is_left_alone() {
    let engine = TestEngine::new();
    let receipt = engine.commit("sometimes useful", 6.0, axis(4, 2)).await;

    // 4 used, 6 ignored: ignore rate 0.6 is not above the demote ceiling,
    // usage 4 is under the promote threshold
    for i in 0..10 {
        let response = engine.query(axis(4, 2), 1).await;
        let used: Vec<&str> = if i < 4 { vec![&receipt.id] } else { vec![] };
        engine.record(&format!("resp-{}", i), &response, &used).await;
    }

    let report = engine.service.adjust_policy().await.unwrap();
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.promoted, 0);
    assert_eq!(report.demoted, 0);

    let entry = engine.store.get(&receipt.id).await.unwrap().unwrap();
    assert_eq!(entry.decay_tier, DecayTier::Medium);
    assert_eq!(entry.importance_score, 6.0);
}
