//! Task pool behavior through the public API

use page_analyzer::pool::{PoolConfig, PoolError, TaskPool, WorkItem};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_fan_out_and_collect_concurrently() {
    let parent = CancellationToken::new();
    let mut pool: TaskPool<String, usize, String> =
        TaskPool::new(&parent, PoolConfig::new(3, false));
    let handle = pool.handle();
    let words = ["alpha", "beta", "gamma", "delta", "epsilon"];

    let feed = async move {
        for word in words {
            handle
                .submit(word.to_string(), move |_token| async move { Ok(word.len()) })
                .await
                .expect("submit should succeed");
        }
    };

    let collect = async {
        let mut total = 0;
        for _ in 0..words.len() {
            let result = pool.next_result().await.expect("pool closed early");
            assert_eq!(result.outcome, Ok(result.label.len()));
            total += result.label.len();
        }
        total
    };

    let ((), total) = tokio::join!(feed, collect);
    assert_eq!(total, words.iter().map(|w| w.len()).sum::<usize>());

    assert!(pool.shutdown().await.is_empty());
    assert!(!parent.is_cancelled());
}

#[tokio::test]
async fn test_fail_fast_stops_accepting_work() {
    let parent = CancellationToken::new();
    let mut pool: TaskPool<&'static str, (), String> =
        TaskPool::new(&parent, PoolConfig::new(2, true));

    pool.submit("fails", |_token| async { Err("broken".to_string()) })
        .await
        .expect("submit should succeed");

    let first = tokio::time::timeout(Duration::from_secs(5), pool.next_result())
        .await
        .expect("timed out")
        .expect("error result must arrive");
    assert_eq!(first.label, "fails");
    assert!(first.is_err());

    tokio::time::timeout(Duration::from_secs(5), pool.token().cancelled())
        .await
        .expect("pool should cancel itself");

    let rejected = pool.submit("late", |_token| async { Ok(()) }).await;
    assert!(matches!(rejected, Err(PoolError::Closed { .. })));

    let nil = pool.submit_item(WorkItem::empty("nil")).await;
    assert!(matches!(nil, Err(PoolError::NilTask { .. })));
}
