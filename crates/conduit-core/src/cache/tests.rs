//! Tests for the layered response cache

use super::*;
use crate::message::Message;
use crate::request::{GenerationParams, Request, Response, ResponseMetadata, StopReason};
use std::sync::Arc;
use tempfile::TempDir;

fn request(prompt: &str, temperature: f64) -> Request {
    Request::new(
        GenerationParams::new("test-model").with_temperature(temperature),
        vec![Message::user(prompt)],
    )
    .unwrap()
}

fn respond(request: &Request, answer: &str) -> Response {
    let message = Message::assistant(answer).with_predecessor(request.messages()[0].id());
    Response::new(
        request.clone(),
        message,
        ResponseMetadata::new("test-model", StopReason::Stop),
    )
}

#[tokio::test]
async fn test_miss_then_hit() {
    let cache = ConduitCache::in_memory("t", 16);
    let req = request("hello", 0.5);

    assert!(cache.get(&req).await.unwrap().is_none());
    cache.set(&req, &respond(&req, "hi")).await.unwrap();

    let again = request("hello", 0.5);
    let hit = cache.get(&again).await.unwrap().unwrap();
    assert_eq!(hit.content(), "hi");

    let stats = cache.cache_stats().await.unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_entries, 1);
    assert!(stats.total_size_bytes > 0);
    assert_eq!(stats.cache_name, "t");
}

#[tokio::test]
async fn test_different_params_miss() {
    let cache = ConduitCache::in_memory("t", 16);
    let req = request("hello", 0.5);
    cache.set(&req, &respond(&req, "hi")).await.unwrap();

    assert!(cache.get(&request("hello", 0.7)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_last_write_wins() {
    let cache = ConduitCache::in_memory("t", 16);
    let req = request("q", 0.0);
    cache.set(&req, &respond(&req, "first")).await.unwrap();
    cache.set(&req, &respond(&req, "second")).await.unwrap();

    assert_eq!(cache.get(&req).await.unwrap().unwrap().content(), "second");
    assert_eq!(cache.cache_stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn test_mismatched_response_rejected() {
    let cache = ConduitCache::in_memory("t", 16);
    let req = request("q", 0.0);
    let other = request("other", 0.0);

    let err = cache.set(&req, &respond(&other, "x")).await.unwrap_err();
    assert!(matches!(err, crate::error::ConduitError::Cache { .. }));
}

#[tokio::test]
async fn test_wipe_does_not_touch_other_namespaces() {
    let shared: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new(64));
    let alpha = ConduitCache::with_storage("alpha", Some(shared.clone()), None);
    let beta = ConduitCache::with_storage("beta", Some(shared), None);

    let req = request("shared prompt", 0.2);
    alpha.set(&req, &respond(&req, "from alpha")).await.unwrap();
    beta.set(&req, &respond(&req, "from beta")).await.unwrap();

    alpha.wipe().await.unwrap();

    assert!(alpha.get(&req).await.unwrap().is_none());
    assert_eq!(beta.get(&req).await.unwrap().unwrap().content(), "from beta");
}

#[tokio::test]
async fn test_wipe_spares_lookalike_namespace_on_disk() {
    let dir = TempDir::new().unwrap();
    let disk: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(dir.path()).unwrap());
    let dotted = ConduitCache::with_storage("team.alpha", None, Some(disk.clone()));
    let underscored = ConduitCache::with_storage("team_alpha", None, Some(disk));

    let req = request("status report", 0.1);
    underscored.set(&req, &respond(&req, "kept")).await.unwrap();
    dotted.set(&req, &respond(&req, "dropped")).await.unwrap();

    dotted.wipe().await.unwrap();

    assert!(dotted.get(&req).await.unwrap().is_none());
    assert_eq!(underscored.get(&req).await.unwrap().unwrap().content(), "kept");
}

#[tokio::test]
async fn test_disk_layer_survives_new_instance() {
    let dir = TempDir::new().unwrap();
    let config = CacheConfig {
        name: "persisted".into(),
        disk_cache_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let req = request("remember me", 1.0);

    {
        let cache = ConduitCache::from_config(&config).unwrap();
        cache.set(&req, &respond(&req, "stored")).await.unwrap();
    }

    let reopened = ConduitCache::from_config(&config).unwrap();
    let hit = reopened.get(&req).await.unwrap().unwrap();
    assert_eq!(hit.content(), "stored");
    assert_eq!(reopened.cache_stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn test_undecodable_entry_is_a_miss() {
    let memory: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new(8));
    let cache = ConduitCache::with_storage("t", Some(memory.clone()), None);
    let req = request("q", 0.0);
    let key = cache.key_for(&req);
    memory
        .set(key.clone(), CacheEntry::new(serde_json::json!({"not": "a response"}), None))
        .await
        .unwrap();

    assert!(cache.get(&req).await.unwrap().is_none());
    assert!(memory.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_oversized_entries_are_skipped() {
    let cache = ConduitCache::in_memory("t", 8).with_max_entry_size(10);
    let req = request("q", 0.0);
    cache.set(&req, &respond(&req, "a long answer")).await.unwrap();
    assert!(cache.get(&req).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_readers_and_writers() {
    let dir = TempDir::new().unwrap();
    let disk: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(dir.path()).unwrap());
    let cache = Arc::new(ConduitCache::with_storage("race", None, Some(disk)));
    let req = request("contended", 0.3);

    let mut handles = Vec::new();
    for i in 0..8 {
        let cache = cache.clone();
        let req = req.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                cache.set(&req, &respond(&req, &format!("answer {}", i))).await.unwrap();
            } else if let Some(found) = cache.get(&req).await.unwrap() {
                assert!(found.content().starts_with("answer "));
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let final_value = cache.get(&req).await.unwrap().unwrap();
    assert!(final_value.content().starts_with("answer "));
}
