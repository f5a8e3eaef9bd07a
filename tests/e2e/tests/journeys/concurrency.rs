//! Journey: the service under concurrent load
//!
//! The facade is shared behind an Arc; commits, queries, and usage
//! writebacks from many tasks must never lose updates or corrupt the
//! counters.

use std::collections::HashSet;
use std::sync::Arc;

use engram_e2e_tests::harness::{axis, TestEngine};
use engram_core::{CommitRequest, QueryRequest};

#[tokio::test]
async fn concurrent_commits_all_land() {
    let engine = Arc::new(TestEngine::new());

    let mut handles = Vec::new();
    for task in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            for i in 0..8 {
                engine
                    .service
                    .commit(CommitRequest {
                        tenant_id: "acme".into(),
                        user_id: "u1".into(),
                        content: format!("task {} note {}", task, i),
                        importance_score: 5.0,
                        embedding: Some(axis(8, task)),
                        ..Default::default()
                    })
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = engine.service.get_stats().await.unwrap();
    assert_eq!(stats.total_memories, 64);
    assert_eq!(stats.commits, 64);
}

#[tokio::test]
async fn concurrent_queries_and_writebacks_stay_consistent() {
    let engine = Arc::new(TestEngine::new());
    for i in 0..8 {
        engine
            .commit(&format!("shared note {}", i), 6.0, axis(8, 0))
            .await;
    }

    let mut handles = Vec::new();
    for task in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let response = engine
                .service
                .query(&QueryRequest {
                    tenant_id: "acme".into(),
                    user_id: "u1".into(),
                    embedding: axis(8, 0),
                    top_k: 4,
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(response.hits.len(), 4);

            let used: HashSet<String> = response.hits.iter().take(1).map(|h| h.id.clone()).collect();
            engine
                .service
                .record_usage(&format!("resp-{}", task), "u1", &response.hits, &used)
                .await
        }));
    }

    let mut recorded = 0;
    for handle in handles {
        recorded += handle.await.unwrap();
    }
    assert_eq!(recorded, 16 * 4);

    let stats = engine.service.get_stats().await.unwrap();
    assert_eq!(stats.queries, 16);
    assert_eq!(stats.usage_links, 64);
    assert_eq!(stats.feedback.total_retrievals, 64);
    assert_eq!(stats.feedback.total_used, 16);
}

#[tokio::test]
async fn background_cycles_run_alongside_traffic() {
    let engine = Arc::new(TestEngine::new());
    for i in 0..4 {
        engine.commit(&format!("note {}", i), 7.0, axis(8, i)).await;
    }

    let querier = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..20 {
                let response = engine.query(axis(8, 0), 2).await;
                assert!(!response.hits.is_empty());
            }
        })
    };
    let maintainer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..5 {
                engine.service.run_decay_cycle().await.unwrap();
                engine.service.run_consolidation().await.unwrap();
            }
        })
    };

    querier.await.unwrap();
    maintainer.await.unwrap();

    // Fresh important entries were never touched by maintenance
    let stats = engine.service.get_stats().await.unwrap();
    assert_eq!(stats.total_memories, 4);
    assert_eq!(stats.archived, 0);
}
