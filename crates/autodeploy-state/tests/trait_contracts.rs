//! Trait contract tests for ProjectStore.
//!
//! These tests verify the behavioral contract of the deployment queue store
//! against both the in-memory fake and the in-memory SurrealDB backend.
//! Any conforming implementation must pass these.

use autodeploy_state::fakes::MemoryProjectStore;
use autodeploy_state::storage_traits::*;
use autodeploy_state::{StorageError, SurrealProjectStore};
use chrono::{TimeZone, Utc};

fn seed() -> Vec<ProjectRecord> {
    vec![
        ProjectRecord::new("web", "/srv/web/Web.csproj", "main")
            .in_group(2)
            .queued(true),
        ProjectRecord::new("api", "/srv/api/Api.csproj", "release").in_group(1),
        ProjectRecord::new("scraper", "/srv/scraper", "main")
            .in_group(2)
            .queued(true),
        ProjectRecord::new("legacy", "/srv/legacy", "main").manual(),
    ]
}

async fn seeded(store: &dyn ProjectStore) {
    for record in seed() {
        store.upsert(record).await.unwrap();
    }
}

async fn check_list_orders_and_filters(store: &dyn ProjectStore) {
    seeded(store).await;
    let names: Vec<String> = store
        .list_automated()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["api", "scraper", "web"]);
}

async fn check_queue_flag_round_trip(store: &dyn ProjectStore) {
    seeded(store).await;
    assert!(store.is_queued("web").await.unwrap());
    assert!(!store.is_queued("api").await.unwrap());

    store.set_queued("web", false).await.unwrap();
    assert!(!store.is_queued("web").await.unwrap());

    store.set_queued("api", true).await.unwrap();
    assert!(store.is_queued("api").await.unwrap());
}

async fn check_unknown_project(store: &dyn ProjectStore) {
    let err = store.is_queued("ghost").await.unwrap_err();
    assert!(matches!(err, StorageError::ProjectNotFound { .. }));

    let err = store.set_queued("ghost", false).await.unwrap_err();
    assert!(matches!(err, StorageError::ProjectNotFound { .. }));
}

async fn check_record_deployment(store: &dyn ProjectStore) {
    seeded(store).await;
    let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    store.record_deployment("scraper", at).await.unwrap();

    let scraper = store
        .list_automated()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == "scraper")
        .unwrap();
    assert_eq!(scraper.last_deployed_at, Some(at));
}

async fn check_upsert_replaces(store: &dyn ProjectStore) {
    seeded(store).await;
    store
        .upsert(ProjectRecord::new("api", "/srv/api2/Api.csproj", "main").in_group(1))
        .await
        .unwrap();
    let all = store.list_automated().await.unwrap();
    assert_eq!(all.iter().filter(|r| r.name == "api").count(), 1);
    let api = all.into_iter().find(|r| r.name == "api").unwrap();
    assert_eq!(api.project_path, "/srv/api2/Api.csproj");
    assert_eq!(api.branch, "main");
}

// ===========================================================================
// MemoryProjectStore
// ===========================================================================

#[tokio::test]
async fn memory_list_orders_and_filters() {
    check_list_orders_and_filters(&MemoryProjectStore::new()).await;
}

#[tokio::test]
async fn memory_queue_flag_round_trip() {
    check_queue_flag_round_trip(&MemoryProjectStore::new()).await;
}

#[tokio::test]
async fn memory_unknown_project() {
    check_unknown_project(&MemoryProjectStore::new()).await;
}

#[tokio::test]
async fn memory_record_deployment() {
    check_record_deployment(&MemoryProjectStore::new()).await;
}

#[tokio::test]
async fn memory_upsert_replaces() {
    check_upsert_replaces(&MemoryProjectStore::new()).await;
}

// ===========================================================================
// SurrealProjectStore (mem://)
// ===========================================================================

#[tokio::test]
async fn surreal_list_orders_and_filters() {
    let store = SurrealProjectStore::in_memory().await.unwrap();
    check_list_orders_and_filters(&store).await;
}

#[tokio::test]
async fn surreal_queue_flag_round_trip() {
    let store = SurrealProjectStore::in_memory().await.unwrap();
    check_queue_flag_round_trip(&store).await;
}

#[tokio::test]
async fn surreal_unknown_project() {
    let store = SurrealProjectStore::in_memory().await.unwrap();
    check_unknown_project(&store).await;
}

#[tokio::test]
async fn surreal_record_deployment() {
    let store = SurrealProjectStore::in_memory().await.unwrap();
    check_record_deployment(&store).await;
}

#[tokio::test]
async fn surreal_upsert_replaces() {
    let store = SurrealProjectStore::in_memory().await.unwrap();
    check_upsert_replaces(&store).await;
}
