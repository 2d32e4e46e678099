//! Command ordering and event publication through the background worker.

mod common;

use common::{Harness, AUDIO, PROXIED_AUDIO};
use core_cache::{CacheCommand, CacheError, CommandOutcome};
use core_runtime::events::{CacheEvent, CoreEvent, EventStream};
use std::time::Duration;

#[tokio::test]
async fn test_caching_twice_yields_exactly_one_entry() {
    let harness = Harness::new(&[]);
    harness.http.serve(PROXIED_AUDIO, 200, "recitation");
    let handle = harness.spawn_worker();

    handle.request(CacheCommand::cache(AUDIO)).await.unwrap();
    handle.request(CacheCommand::cache(AUDIO)).await.unwrap();

    assert_eq!(
        harness.store.keys("media-v1").await.unwrap(),
        vec![PROXIED_AUDIO]
    );
    assert!(handle.is_cached(AUDIO).await.unwrap());
}

#[tokio::test]
async fn test_cache_then_uncache_never_leaves_the_entry() {
    let harness = Harness::new(&[]);
    harness.http.serve(PROXIED_AUDIO, 200, "recitation");
    harness
        .http
        .delay(PROXIED_AUDIO, Duration::from_millis(30));
    let handle = harness.spawn_worker();

    handle.post(CacheCommand::cache(AUDIO)).await.unwrap();
    let outcome = handle.request(CacheCommand::uncache(AUDIO)).await.unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::Evicted {
            canonical_key: PROXIED_AUDIO.to_string(),
            existed: true,
        }
    );
    assert!(!handle.is_cached(AUDIO).await.unwrap());
}

#[tokio::test]
async fn test_commands_for_different_keys_run_concurrently() {
    let harness = Harness::new(&[]);
    let slow = "https://dua.example/audio/slow.mp3";
    let fast = "https://dua.example/audio/fast.mp3";
    harness.http.serve(slow, 200, "slow");
    harness.http.serve(fast, 200, "fast");
    harness.http.delay(slow, Duration::from_millis(200));
    let handle = harness.spawn_worker();

    handle.post(CacheCommand::cache(slow)).await.unwrap();
    tokio::time::timeout(
        Duration::from_millis(150),
        handle.request(CacheCommand::cache(fast)),
    )
    .await
    .expect("fast command should not wait for the slow one")
    .unwrap();

    assert!(!handle.is_cached(slow).await.unwrap());
}

#[tokio::test]
async fn test_outcomes_are_published_as_events() {
    let harness = Harness::new(&[]);
    harness.http.serve(PROXIED_AUDIO, 200, "recitation");
    let mut events = EventStream::new(harness.event_bus.subscribe())
        .filter(|event| matches!(event, CoreEvent::Cache(_)));
    let handle = harness.spawn_worker();

    handle
        .post_json(&format!(
            r#"{{"action":"cachePrayer","url":"{}","cache":true}}"#,
            AUDIO
        ))
        .await
        .unwrap();
    handle
        .post_json(r#"{"action":"cachePrayer","url":"https://cdn.example.org/audio/missing.mp3","cache":true}"#)
        .await
        .unwrap();

    let mut cached = false;
    let mut failed = false;
    for _ in 0..2 {
        match events.recv().await.unwrap() {
            CoreEvent::Cache(CacheEvent::AssetCached { url, canonical_key }) => {
                assert_eq!(url, AUDIO);
                assert_eq!(canonical_key, PROXIED_AUDIO);
                cached = true;
            }
            CoreEvent::Cache(CacheEvent::AssetCacheFailed { url, message }) => {
                assert!(url.ends_with("missing.mp3"));
                assert!(message.contains("HTTP 404"));
                failed = true;
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert!(cached && failed);
}

#[tokio::test]
async fn test_clear_all_waits_for_earlier_commands_and_requests_reload() {
    let harness = Harness::new(&[]);
    harness.http.serve(PROXIED_AUDIO, 200, "recitation");
    harness
        .http
        .delay(PROXIED_AUDIO, Duration::from_millis(30));
    let mut events = harness.event_bus.subscribe();
    let handle = harness.spawn_worker();

    handle.post(CacheCommand::cache(AUDIO)).await.unwrap();
    let outcome = handle.request(CacheCommand::ClearAll).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Cleared { namespaces: 1 });
    assert!(!handle.is_cached(AUDIO).await.unwrap());
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Cache(CacheEvent::AssetCached {
            url: AUDIO.to_string(),
            canonical_key: PROXIED_AUDIO.to_string(),
        })
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Cache(CacheEvent::CacheCleared { namespaces: 1 })
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Cache(CacheEvent::ReloadRequired)
    );
}

#[tokio::test]
async fn test_malformed_messages_are_rejected_at_the_handle() {
    let harness = Harness::new(&[]);
    let handle = harness.spawn_worker();

    assert!(matches!(
        handle.post_json(r#"{"action":"purge"}"#).await,
        Err(CacheError::InvalidCommand(_))
    ));
}

#[tokio::test]
async fn test_multiple_handles_post_concurrently() {
    let harness = Harness::new(&[]);
    for i in 0..8 {
        harness
            .http
            .serve(&format!("https://dua.example/audio/{}.mp3", i), 200, "a");
    }
    let handle = harness.spawn_worker();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .request(CacheCommand::cache(format!(
                        "https://dua.example/audio/{}.mp3",
                        i
                    )))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(harness.store.keys("media-v1").await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_worker_stops_on_shutdown() {
    let harness = Harness::new(&[]);
    let (worker, handle) = core_cache::CacheWorker::new(
        harness.router.clone(),
        harness.assets.clone(),
        harness.event_bus.clone(),
        4,
    );
    let running = worker.spawn();

    handle.shutdown().await.unwrap();
    running.await.unwrap();

    assert!(handle.is_closed());
    assert!(matches!(
        handle.post(CacheCommand::ClearAll).await,
        Err(CacheError::WorkerStopped)
    ));
}

#[tokio::test]
async fn test_worker_stops_when_every_handle_is_dropped() {
    let harness = Harness::new(&[]);
    let (worker, handle) = core_cache::CacheWorker::new(
        harness.router.clone(),
        harness.assets.clone(),
        harness.event_bus.clone(),
        4,
    );
    let running = worker.spawn();
    let second = handle.clone();

    drop(handle);
    drop(second);

    tokio::time::timeout(Duration::from_secs(1), running)
        .await
        .expect("worker should exit")
        .unwrap();
}
