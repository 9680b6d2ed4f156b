//! End-to-end scenarios for the directory service

use std::sync::Arc;
use std::time::Duration;

use roster_core::{fields, Document, KeyRouter, RosterError};
use roster_search::{BatchSearchResult, DirectoryService, SearchConfig, SearchMethod, SearchOptions};
use roster_storage::{BatchOutcome, CacheConfig, DirectoryCache, InMemoryStore};
use roster_test_utils::{assertions, fixtures, InstrumentedStore};

fn service(store: &Arc<InstrumentedStore>) -> DirectoryService {
    service_with(store, SearchConfig::default())
}

fn service_with(store: &Arc<InstrumentedStore>, config: SearchConfig) -> DirectoryService {
    DirectoryService::new(store.clone(), store.clone(), config).unwrap()
}

fn outcome(result: &BatchSearchResult) -> BatchOutcome {
    BatchOutcome {
        found: result.found.clone(),
        not_found: result.not_found.clone(),
        errors: result.errors.clone(),
    }
}

fn seeded_section(code: &str, count: u32) -> (Arc<InstrumentedStore>, Vec<String>) {
    let inner = InMemoryStore::new();
    let ids = fixtures::seed_section(&inner, code, count);
    (Arc::new(InstrumentedStore::new(inner)), ids)
}

#[test]
fn scenario_a_admission_number_routes_to_cse_1() {
    let router = KeyRouter::standard();
    let parsed = router.parse("22015112001").unwrap();
    assert_eq!(parsed.section_code, "51");
    assert_eq!(router.target_partition("22015112001"), Some("students_cse_1"));
}

#[tokio::test]
async fn scenario_b_unroutable_id_is_scanned_then_not_found() {
    let router = KeyRouter::standard();
    assert!(router.parse("invalid123").is_none());
    assert!(router.target_partition("invalid123").is_none());

    let store = Arc::new(fixtures::instrumented_store());
    let svc = service(&store);
    let result = svc
        .batch_search(&["invalid123"], &SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(result.method, SearchMethod::Direct);
    assert_eq!(result.not_found, vec!["invalid123"]);
    assert!(result.errors.is_empty());
    // Every partition holding data was tried once.
    assert_eq!(
        store.query_log(),
        vec!["students_cse_1", "students_it_1", "students_legacy_1"]
    );
}

#[tokio::test]
async fn scenario_c_large_cold_batch_uses_one_smart_load() {
    let (store, ids) = seeded_section("51", 60);
    let svc = service(&store);

    let result = svc.batch_search(&ids, &SearchOptions::default()).await.unwrap();

    assert_eq!(result.method, SearchMethod::Cached);
    assert!(!result.fell_back);
    assert_eq!(result.found.len(), 60);
    let stats = svc.get_stats().await;
    assert_eq!(stats.smart_loads, 1);
    assert_eq!(stats.full_loads, 0);
    assert_eq!(store.queries_for("students_cse_1"), 1);
    assert_eq!(store.query_count(), 1);
}

#[tokio::test]
async fn scenario_d_small_cold_batch_goes_direct() {
    let store = Arc::new(fixtures::instrumented_store());
    let svc = service(&store);
    let ids = [
        "22015112001",
        "22015112002",
        "22015112003",
        "22016112001",
        "22016112002",
    ];

    let result = svc.batch_search(&ids, &SearchOptions::default()).await.unwrap();

    assert_eq!(result.method, SearchMethod::Direct);
    assert_eq!(result.found.len(), 5);
    assert_eq!(svc.cache().record_count().await, 0);
    let batch = outcome(&result);
    assertions::assert_found_in(&batch, "22016112002", "students_it_1");
}

#[tokio::test]
async fn concurrent_full_loads_share_one_pass() {
    let store = Arc::new(fixtures::instrumented_store().with_latency(Duration::from_millis(20)));
    let cache = DirectoryCache::new(store.clone(), store.clone(), CacheConfig::default());

    let (first, second) = tokio::join!(cache.load_all(false), cache.load_all(false));

    let first = first.unwrap();
    assert_eq!(first, second.unwrap());
    assert_eq!(first.total_records, 6);
    assert_eq!(store.registry_count(), 1);
    assert_eq!(store.queries_for("students_cse_1"), 1);
    assert_eq!(cache.stats().await.full_loads, 1);
}

#[tokio::test]
async fn full_load_is_fresh_until_the_interval_passes() {
    let store = Arc::new(fixtures::instrumented_store());
    let cache = DirectoryCache::new(
        store.clone(),
        store.clone(),
        CacheConfig::new().with_refresh_interval(Duration::from_secs(300)),
    );
    assert!(cache.needs_refresh().await);

    cache.load_all(false).await.unwrap();
    let now = chrono::Utc::now();
    assert!(!cache.needs_refresh_at(now).await);
    assert!(cache.needs_refresh_at(now + chrono::Duration::seconds(301)).await);

    // A fresh non-empty cache answers without touching the store.
    store.reset_counts();
    cache.load_all(false).await.unwrap();
    assert_eq!(store.registry_count(), 0);
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn loading_a_partition_twice_reads_once() {
    let store = Arc::new(fixtures::instrumented_store());
    let cache = DirectoryCache::new(store.clone(), store.clone(), CacheConfig::default());

    let first = cache.load_partition("students_cse_1").await;
    let second = cache.load_partition("students_cse_1").await;

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert_eq!(store.queries_for("students_cse_1"), 1);
    assert!(cache.is_partition_loaded("students_cse_1").await);
    for id in ["22015112001", "22015112002", "22015112003"] {
        assert!(cache.search_by_primary(id).await.from_cache);
    }
}

#[tokio::test]
async fn duplicates_are_reported_per_occurrence_on_both_paths() {
    let ids = ["22015112001", "22015112001", "invalid123", "invalid123", "22016112002"];
    for method in [SearchMethod::Cached, SearchMethod::Direct] {
        let store = Arc::new(fixtures::instrumented_store());
        let svc = service(&store);
        let result = svc
            .batch_search(&ids, &SearchOptions::forced(method))
            .await
            .unwrap();
        assert_eq!(result.method, method);
        assert_eq!(result.reason, "caller override");
        assertions::assert_accounts_for(&outcome(&result), &ids);
        assert_eq!(result.found.len(), 3);
        assert_eq!(result.not_found.len(), 2);
    }
}

#[tokio::test]
async fn failed_partition_becomes_item_errors_in_cached_path() {
    let store = Arc::new(fixtures::instrumented_store());
    store.fail_partition("students_it_1");
    let svc = service(&store);
    let ids = ["22015112001", "22016112001", "22016112002"];

    let result = svc
        .batch_search(&ids, &SearchOptions::forced(SearchMethod::Cached))
        .await
        .unwrap();

    assert_eq!(result.found.len(), 1);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors.iter().all(|e| e.id.starts_with("22016")));
    assertions::assert_accounts_for(&outcome(&result), &ids);
}

#[tokio::test]
async fn both_paths_failing_surfaces_one_error() {
    let store = Arc::new(fixtures::instrumented_store());
    store.fail_partition("students_cse_1");
    let svc = service(&store);

    let result = svc
        .batch_search(&["22015112001", "22015112002"], &SearchOptions::default())
        .await;

    assert!(matches!(result, Err(RosterError::AllStrategiesFailed { .. })));
}

#[tokio::test]
async fn unreachable_partition_keeps_the_rest_of_the_batch() {
    let store = Arc::new(fixtures::instrumented_store());
    store.fail_partition("students_cse_1");
    let svc = service(&store);
    let ids = ["22015112001", "LEGACY0001"];

    let result = svc.batch_search(&ids, &SearchOptions::default()).await.unwrap();

    assert!(!result.fell_back);
    assertions::assert_accounts_for(&outcome(&result), &ids);
    assertions::assert_found_in(&outcome(&result), "LEGACY0001", "students_legacy_1");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].id, "22015112001");
}

#[tokio::test]
async fn both_paths_agree_on_how_primary_keys_are_stored() {
    let seed = || {
        let inner = InMemoryStore::new();
        inner.insert_document(
            "students_cse_1",
            Document::new("doc-numeric")
                .with_field(fields::ADMISSION_NUMBER, serde_json::json!(22015112001u64))
                .with_field(fields::ACTIVE, true),
        );
        inner.insert_document(
            "students_cse_1",
            Document::new("doc-padded")
                .with_field(fields::ADMISSION_NUMBER, " 22015112002 ")
                .with_field(fields::ACTIVE, true),
        );
        inner.insert_document(
            "students_cse_1",
            Document::new("22015112003").with_field(fields::ACTIVE, true),
        );
        Arc::new(InstrumentedStore::new(inner))
    };
    let ids = ["22015112001", "22015112002", "22015112003"];

    for method in [SearchMethod::Cached, SearchMethod::Direct] {
        let svc = service(&seed());
        let result = svc
            .batch_search(&ids, &SearchOptions::forced(method))
            .await
            .unwrap();
        assert_eq!(result.method, method);
        assert_eq!(result.found.len(), 3, "{method} path missed a stored key");
        assert!(result.not_found.is_empty());
    }
}

#[tokio::test]
async fn registry_outage_keeps_direct_lookups_working() {
    let store = Arc::new(fixtures::instrumented_store());
    let svc = service(&store);
    svc.preload().await.unwrap();

    store.set_registry_down(true);
    assertions::assert_err(&svc.refresh().await);
    assert!(svc.get_stats().await.last_refresh_error.is_some());

    let result = svc
        .batch_search(
            &["22016112001", "LEGACY0001"],
            &SearchOptions::forced(SearchMethod::Direct),
        )
        .await
        .unwrap();
    assertions::assert_found_in(&outcome(&result), "22016112001", "students_it_1");
    // Without the registry only section table partitions are scanned.
    assert_eq!(result.not_found, vec!["LEGACY0001"]);

    store.set_registry_down(false);
    assertions::assert_ok(&svc.refresh().await);
    assert!(svc.get_stats().await.last_refresh_error.is_none());
}

#[tokio::test]
async fn secondary_key_lookup_triggers_full_load_once() {
    let store = Arc::new(fixtures::instrumented_store());
    let svc = service(&store);

    let hit = svc.search_by_secondary("LEG001").await;
    assert!(hit.found);
    assert_eq!(hit.record.unwrap().primary_key, "LEGACY0001");

    store.reset_counts();
    let miss = svc.search_by_secondary("NOPE").await;
    assert!(!miss.found);
    assert!(miss.error.is_none());
    assert_eq!(store.registry_count(), 0);
}

#[tokio::test]
async fn chunked_search_picks_a_path_per_chunk() {
    let (store, ids) = seeded_section("51", 120);
    let svc = service_with(
        &store,
        SearchConfig {
            run_chunk_size: 50,
            chunk_delay: Duration::ZERO,
            ..Default::default()
        },
    );

    let result = svc.batch_search_chunked(&ids, &SearchOptions::default()).await;

    assert_eq!(result.total(), 120);
    assert_eq!(result.found.len(), 120);
    let methods: Vec<_> = result.chunks.iter().map(|c| c.method).collect();
    assert_eq!(
        methods,
        vec![
            Some(SearchMethod::Cached),
            Some(SearchMethod::Cached),
            Some(SearchMethod::Direct)
        ]
    );
    assert_eq!(result.failed_chunks(), 0);
}

#[tokio::test]
async fn chunked_search_turns_failed_chunks_into_item_errors() {
    let store = Arc::new(fixtures::instrumented_store());
    store.fail_partition("students_cse_1");
    let svc = service_with(
        &store,
        SearchConfig {
            run_chunk_size: 2,
            chunk_delay: Duration::ZERO,
            ..Default::default()
        },
    );
    let ids = ["22015112001", "22015112002", "22016112001"];

    let result = svc.batch_search_chunked(&ids, &SearchOptions::default()).await;

    assert_eq!(result.chunks.len(), 2);
    assert_eq!(result.failed_chunks(), 1);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.found.len(), 1);
    assert_eq!(result.total(), 3);
}

#[tokio::test]
async fn monitored_operations_show_up_in_metrics() {
    let store = Arc::new(fixtures::instrumented_store());
    let svc = service(&store);
    svc.batch_search(&["22015112001"], &SearchOptions::default())
        .await
        .unwrap();
    svc.search_by_primary("22016112001").await;

    let report = svc.performance_report();
    assert_eq!(report.operations, 2);
    assert_eq!(report.by_method.get("direct"), Some(&1));

    let text = svc.render_metrics().unwrap();
    assert!(text.contains("operation=\"batch_search\""));
    assert!(text.contains("operation=\"search_by_primary\""));
}

#[tokio::test]
async fn independent_services_do_not_share_state() {
    let store = Arc::new(fixtures::instrumented_store());
    let a = service(&store);
    let b = service(&store);

    a.preload().await.unwrap();
    assert_eq!(a.get_stats().await.total_records, 6);
    assert_eq!(b.get_stats().await.total_records, 0);
    assert_eq!(b.performance_report().operations, 0);
}
