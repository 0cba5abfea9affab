use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use weft_bridge::{spawn_in_process, Bridge, HandlerError, HandlerRegistry};
use weft_core::calls::{LedgerPosting, RecordCollection};
use weft_core::{BridgeError, Domain, KeyScope, Operation, QueryKey, TransportMode};
use weft_fixtures::FixtureSet;
use weft_query::{
    select_transport, CacheConfig, ClientConfig, DemoConfig, QueryClient, QueryStatus,
};
use weft_test_utils::assertions::{assert_transport, assert_unauthorized};
use weft_test_utils::{SpyChannel, SpyTransport};

fn spy_client(config: CacheConfig) -> (QueryClient, Arc<SpyTransport>) {
    let spy = Arc::new(SpyTransport::new());
    (QueryClient::with_config(spy.clone(), config), spy)
}

fn demo_client() -> QueryClient {
    let transport = select_transport(None, FixtureSet::demo(), &DemoConfig { latency_ms: 0 });
    QueryClient::with_config(transport, CacheConfig::default())
}

fn status(client: &QueryClient, operation: Operation, args: &Value) -> QueryStatus {
    client.snapshot(operation, args).unwrap().status
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// COHERENCE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_reads_share_one_transport_call() {
    let (client, spy) = spy_client(CacheConfig::default());
    spy.set_delay(Duration::from_millis(50));
    spy.set_response(Operation::AccountsList, json!([{"id": "1"}]));

    let (a, b) = tokio::join!(
        client.query(Operation::AccountsList, json!({})),
        client.query(Operation::AccountsList, json!({})),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(spy.call_count(Operation::AccountsList), 1);
    let stats = client.stats().unwrap();
    assert_eq!((stats.misses, stats.shared), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn argument_key_order_does_not_split_the_cache() {
    let (client, spy) = spy_client(CacheConfig::default());
    spy.set_delay(Duration::from_millis(10));

    let (a, b) = tokio::join!(
        client.query(Operation::OrdersList, json!({"status": "SHIPPED", "accountId": "2"})),
        client.query(Operation::OrdersList, json!({"accountId": "2", "status": "SHIPPED"})),
    );
    a.unwrap();
    b.unwrap();
    client
        .query(Operation::OrdersList, json!({"status": "SHIPPED", "accountId": "2"}))
        .await
        .unwrap();

    assert_eq!(spy.call_count(Operation::OrdersList), 1);
}

#[tokio::test]
async fn fresh_read_is_answered_from_cache() {
    let (client, spy) = spy_client(CacheConfig::default());
    client.query(Operation::ProductsList, json!({})).await.unwrap();
    client.query(Operation::ProductsList, json!({})).await.unwrap();

    assert_eq!(spy.call_count(Operation::ProductsList), 1);
    assert_eq!(client.stats().unwrap().hits, 1);
}

#[tokio::test]
async fn refetch_bypasses_fresh_entry() {
    let (client, spy) = spy_client(CacheConfig::default());
    client.query(Operation::ProductsList, json!({})).await.unwrap();
    spy.set_response(Operation::ProductsList, json!([{"id": "P-01"}]));

    let refreshed = client.refetch(Operation::ProductsList, json!({})).await.unwrap();
    assert_eq!(refreshed, json!([{"id": "P-01"}]));
    assert_eq!(spy.call_count(Operation::ProductsList), 2);
}

// ============================================================================
// INVALIDATION
// ============================================================================

#[tokio::test]
async fn status_update_cascades_to_filtered_order_list() {
    let (client, spy) = spy_client(CacheConfig::default());
    let shipped = json!({"status": "SHIPPED"});
    client.query(Operation::OrdersList, shipped.clone()).await.unwrap();
    client.query(Operation::ProductsList, json!({})).await.unwrap();

    let response = client
        .mutate(
            Operation::OrdersUpdateStatus,
            json!({"id": "O-2", "status": "DELIVERED"}),
        )
        .await
        .unwrap();
    assert!(response.success);

    assert_eq!(status(&client, Operation::OrdersList, &shipped), QueryStatus::Stale);
    assert_eq!(
        status(&client, Operation::ProductsList, &json!({})),
        QueryStatus::Fresh
    );

    client.query(Operation::OrdersList, shipped).await.unwrap();
    assert_eq!(spy.call_count(Operation::OrdersList), 2);
    assert_eq!(spy.call_count(Operation::ProductsList), 1);
}

#[tokio::test]
async fn explicit_invalidation_reports_affected_entries() {
    let (client, _spy) = spy_client(CacheConfig::default());
    client.query(Operation::OrdersList, json!({})).await.unwrap();
    client.query(Operation::OrdersList, json!({"status": "PENDING"})).await.unwrap();
    client.query(Operation::OrdersGet, json!({"id": "O-1"})).await.unwrap();
    client.query(Operation::AccountsList, json!({})).await.unwrap();

    assert_eq!(client.invalidate(Operation::OrdersList).unwrap(), 2);
    assert_eq!(client.invalidate(Domain::Orders).unwrap(), 3);
    let exact = QueryKey::new(Operation::AccountsList, &json!({}));
    assert_eq!(client.invalidate(exact).unwrap(), 1);
    assert_eq!(client.invalidate(KeyScope::All).unwrap(), 4);
}

#[tokio::test(start_paused = true)]
async fn watched_key_is_refetched_after_invalidation() {
    let (client, spy) = spy_client(CacheConfig::default());
    let shipped = json!({"status": "SHIPPED"});
    let mut rx = client.watch(Operation::OrdersList, &shipped).unwrap();
    client.query(Operation::OrdersList, shipped.clone()).await.unwrap();
    spy.set_response(Operation::OrdersList, json!([{"id": "O-2"}]));

    client
        .mutate(Operation::OrdersCreate, json!({"accountId": "1"}))
        .await
        .unwrap();

    let snapshot = rx
        .wait_for(|s| s.status == QueryStatus::Fresh)
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.data, Some(json!([{"id": "O-2"}])));
    assert_eq!(spy.call_count(Operation::OrdersList), 2);
}

#[tokio::test(start_paused = true)]
async fn background_refetch_can_be_disabled() {
    let (client, spy) = spy_client(CacheConfig::new().with_refetch_active(false));
    let _rx = client.watch(Operation::CashList, &json!({})).unwrap();
    client.query(Operation::CashList, json!({})).await.unwrap();

    client
        .mutate(Operation::CashEntry, json!({"amount": "10.00"}))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(spy.call_count(Operation::CashList), 1);
    assert_eq!(status(&client, Operation::CashList, &json!({})), QueryStatus::Stale);
}

#[test]
fn invalidation_outside_a_runtime_leaves_watched_key_stale() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let (client, spy) = spy_client(CacheConfig::default());
    let _rx = client.watch(Operation::OrdersList, &json!({})).unwrap();
    runtime
        .block_on(client.query(Operation::OrdersList, json!({})))
        .unwrap();

    assert_eq!(client.invalidate(Domain::Orders).unwrap(), 1);
    assert_eq!(status(&client, Operation::OrdersList, &json!({})), QueryStatus::Stale);
    assert_eq!(spy.call_count(Operation::OrdersList), 1);

    runtime
        .block_on(client.query(Operation::OrdersList, json!({})))
        .unwrap();
    assert_eq!(spy.call_count(Operation::OrdersList), 2);
    assert_eq!(status(&client, Operation::OrdersList, &json!({})), QueryStatus::Fresh);
}

// ============================================================================
// FAILURE ISOLATION
// ============================================================================

#[tokio::test]
async fn refused_mutation_leaves_caches_untouched() {
    let (client, spy) = spy_client(CacheConfig::default());
    client.query(Operation::OrdersList, json!({})).await.unwrap();
    spy.set_response(
        Operation::OrdersUpdateStatus,
        json!({"success": false, "error": "order is locked"}),
    );

    let response = client
        .mutate(Operation::OrdersUpdateStatus, json!({"id": "O-1", "status": "SHIPPED"}))
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("order is locked"));

    assert_eq!(status(&client, Operation::OrdersList, &json!({})), QueryStatus::Fresh);
    client.query(Operation::OrdersList, json!({})).await.unwrap();
    assert_eq!(spy.call_count(Operation::OrdersList), 1);
    assert_eq!(spy.call_count(Operation::OrdersUpdateStatus), 1);
    assert_eq!(client.stats().unwrap().invalidations, 0);
}

#[tokio::test]
async fn failed_mutation_leaves_caches_untouched_and_is_not_retried() {
    let (client, spy) = spy_client(CacheConfig::default());
    client.query(Operation::AccountsList, json!({})).await.unwrap();
    spy.set_failure(
        Operation::AccountsCreate,
        BridgeError::transport("accounts:create", "host unreachable").into(),
    );

    let result = client
        .mutate(Operation::AccountsCreate, json!({"name": "New"}))
        .await;
    assert_transport(&result);

    assert_eq!(status(&client, Operation::AccountsList, &json!({})), QueryStatus::Fresh);
    assert_eq!(spy.call_count(Operation::AccountsCreate), 1);
}

#[tokio::test]
async fn read_errors_are_never_cached_as_data() {
    let (client, spy) = spy_client(CacheConfig::default());
    spy.set_failure(
        Operation::AccountsList,
        BridgeError::transport("accounts:list", "host unreachable").into(),
    );

    let result = client.query(Operation::AccountsList, json!({})).await;
    assert_transport(&result);
    let snapshot = client.snapshot(Operation::AccountsList, &json!({})).unwrap();
    assert_eq!(snapshot.status, QueryStatus::Error);
    assert!(snapshot.data.is_none());

    spy.set_response(Operation::AccountsList, json!([{"id": "1"}]));
    let rows = client.query(Operation::AccountsList, json!({})).await.unwrap();
    assert_eq!(rows, json!([{"id": "1"}]));
    assert_eq!(spy.call_count(Operation::AccountsList), 2);
    assert_eq!(
        status(&client, Operation::AccountsList, &json!({})),
        QueryStatus::Fresh
    );
}

#[tokio::test]
async fn failed_refetch_keeps_last_good_data() {
    let (client, spy) = spy_client(CacheConfig::default());
    spy.set_response(Operation::InvoicesList, json!([{"id": "I-1"}]));
    client.query(Operation::InvoicesList, json!({})).await.unwrap();

    client.invalidate(Domain::Invoices).unwrap();
    spy.set_failure(
        Operation::InvoicesList,
        BridgeError::transport("invoices:list", "host unreachable").into(),
    );
    assert!(client.query(Operation::InvoicesList, json!({})).await.is_err());

    let snapshot = client.snapshot(Operation::InvoicesList, &json!({})).unwrap();
    assert!(snapshot.is_stale_while_error());
    assert_eq!(snapshot.data, Some(json!([{"id": "I-1"}])));
    assert!(snapshot.error.unwrap().is_transport());
}

// ============================================================================
// ORDERING AND STALENESS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn slower_older_fetch_never_overwrites_newer_result() {
    let (client, spy) = spy_client(CacheConfig::default());
    spy.enqueue(Operation::AccountsList, Duration::from_millis(100), Ok(json!("old")));
    spy.enqueue(Operation::AccountsList, Duration::from_millis(10), Ok(json!("new")));

    let (first, second) = tokio::join!(
        client.query(Operation::AccountsList, json!({})),
        client.refetch(Operation::AccountsList, json!({})),
    );
    assert_eq!(first.unwrap(), json!("old"));
    assert_eq!(second.unwrap(), json!("new"));

    let snapshot = client.snapshot(Operation::AccountsList, &json!({})).unwrap();
    assert_eq!(snapshot.data, Some(json!("new")));
    assert_eq!(snapshot.status, QueryStatus::Fresh);
    assert_eq!(
        client.query(Operation::AccountsList, json!({})).await.unwrap(),
        json!("new")
    );
}

#[tokio::test(start_paused = true)]
async fn fetch_started_before_invalidation_leaves_entry_stale() {
    let (client, spy) = spy_client(CacheConfig::default());
    spy.enqueue(Operation::LedgerList, Duration::from_millis(50), Ok(json!([1])));

    let (result, _) = tokio::join!(client.query(Operation::LedgerList, json!({})), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        client.invalidate(Domain::Ledger).unwrap()
    });

    assert_eq!(result.unwrap(), json!([1]));
    let snapshot = client.snapshot(Operation::LedgerList, &json!({})).unwrap();
    assert_eq!(snapshot.data, Some(json!([1])));
    assert_eq!(snapshot.status, QueryStatus::Stale);
}

#[tokio::test(start_paused = true)]
async fn entries_go_stale_after_their_class_window() {
    let (client, spy) = spy_client(CacheConfig::default());

    client.query(Operation::AccountsList, json!({})).await.unwrap();
    client.query(Operation::InventoryWarehouses, json!({})).await.unwrap();

    tokio::time::advance(Duration::from_secs(29)).await;
    client.query(Operation::AccountsList, json!({})).await.unwrap();
    assert_eq!(spy.call_count(Operation::AccountsList), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(status(&client, Operation::AccountsList, &json!({})), QueryStatus::Stale);
    client.query(Operation::AccountsList, json!({})).await.unwrap();
    assert_eq!(spy.call_count(Operation::AccountsList), 2);

    // Reference data outlives the live window.
    client.query(Operation::InventoryWarehouses, json!({})).await.unwrap();
    assert_eq!(spy.call_count(Operation::InventoryWarehouses), 1);
    tokio::time::advance(Duration::from_secs(300)).await;
    client.query(Operation::InventoryWarehouses, json!({})).await.unwrap();
    assert_eq!(spy.call_count(Operation::InventoryWarehouses), 2);
}

#[tokio::test]
async fn cache_stays_within_its_bound() {
    let (client, _spy) = spy_client(CacheConfig::new().with_max_entries(3));
    for search in ["a", "b", "c", "d", "e"] {
        client
            .query(Operation::AccountsList, json!({ "search": search }))
            .await
            .unwrap();
    }
    let stats = client.stats().unwrap();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.evictions, 2);
    assert_eq!(
        status(&client, Operation::AccountsList, &json!({"search": "a"})),
        QueryStatus::Idle
    );
}

#[tokio::test(start_paused = true)]
async fn abandoned_read_does_not_pin_its_entry() {
    let (client, spy) = spy_client(CacheConfig::new().with_max_entries(1));
    spy.set_delay(Duration::from_millis(50));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        client.query(Operation::AccountsList, json!({})),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(status(&client, Operation::AccountsList, &json!({})), QueryStatus::Idle);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(status(&client, Operation::AccountsList, &json!({})), QueryStatus::Idle);

    client.query(Operation::OrdersList, json!({})).await.unwrap();
    let stats = client.stats().unwrap();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.evictions, 1);
}

// ============================================================================
// DEMO MODE AND PARITY
// ============================================================================

#[tokio::test]
async fn demo_collection_is_acknowledged_and_invalidates() {
    let client = demo_client();
    assert_eq!(client.mode(), TransportMode::Fixture);

    let before = client.query(Operation::AccountsList, json!({})).await.unwrap();
    client.query(Operation::AnalyticsDashboard, json!({})).await.unwrap();
    client.query(Operation::OrdersList, json!({})).await.unwrap();

    let ack = client
        .mutate(
            Operation::LedgerCollection,
            json!({
                "accountId": "1",
                "amount": "500.00",
                "currency": "TRY",
                "exchangeRate": "1.0000",
                "description": "Counter collection"
            }),
        )
        .await
        .unwrap();
    assert_eq!(ack.into_value(), json!({"success": true}));

    assert_eq!(status(&client, Operation::AccountsList, &json!({})), QueryStatus::Stale);
    assert_eq!(
        status(&client, Operation::AnalyticsDashboard, &json!({})),
        QueryStatus::Stale
    );
    assert_eq!(status(&client, Operation::OrdersList, &json!({})), QueryStatus::Fresh);

    // Fixtures are never modified by demo writes.
    let after = client.query(Operation::AccountsList, json!({})).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn typed_collection_in_demo_mode_is_applied_without_data() {
    let client = demo_client();
    let outcome = client
        .submit(&RecordCollection(LedgerPosting {
            account_id: "4".to_string(),
            amount: "250.00".to_string(),
            currency: "USD".to_string(),
            exchange_rate: "32.5000".to_string(),
            description: "Wire transfer".to_string(),
        }))
        .await
        .unwrap();
    assert!(outcome.is_applied());
}

#[tokio::test]
async fn invalid_collection_never_reaches_the_transport() {
    let (client, spy) = spy_client(CacheConfig::default());
    let result = client
        .submit(&RecordCollection(LedgerPosting {
            account_id: "1".to_string(),
            amount: "-5.00".to_string(),
            currency: "TRY".to_string(),
            exchange_rate: "1.0000".to_string(),
            description: String::new(),
        }))
        .await;
    weft_test_utils::assertions::assert_validation(&result);
    assert_eq!(spy.total_calls(), 0);
}

#[tokio::test]
async fn bridge_and_fixture_modes_agree_on_filtered_lists() {
    let fixtures = Arc::new(FixtureSet::demo());
    let mut registry = HandlerRegistry::new();
    let served = Arc::clone(&fixtures);
    registry.register_fn(Operation::ProductsList, move |args| {
        let served = Arc::clone(&served);
        async move {
            served
                .respond(Operation::ProductsList, &args)
                .map_err(|e| HandlerError::internal(e.to_string()))
        }
    });
    let (bridge, _host) = ClientConfig::default().spawn_bridge(registry);

    let real = QueryClient::with_config(
        select_transport(Some(bridge), FixtureSet::demo(), &DemoConfig { latency_ms: 0 }),
        CacheConfig::default(),
    );
    let demo = demo_client();
    assert_eq!(real.mode(), TransportMode::Bridge);

    let args = json!({"search": "ant"});
    let via_bridge = real.query(Operation::ProductsList, args.clone()).await.unwrap();
    let via_fixtures = demo.query(Operation::ProductsList, args).await.unwrap();

    assert_eq!(via_bridge, via_fixtures);
    assert_eq!(ids(&via_fixtures), vec!["P-01", "P-02", "P-05"]);
}

#[tokio::test]
async fn undeclared_name_is_rejected_before_any_transport() {
    let spy = SpyChannel::new();
    let client = QueryClient::with_config(
        Arc::new(Bridge::new(spy.clone())),
        CacheConfig::default(),
    );

    let result = client.call("accounts:delete", json!({"id": "1"})).await;
    assert_unauthorized(&result, "accounts:delete");
    let message = result.unwrap_err().to_string();
    assert!(message.contains("not allowed"), "{}", message);
    assert_eq!(spy.seen_count(), 0);
}

#[tokio::test]
async fn host_shutdown_surfaces_as_transport_failure() {
    let (bridge, host) = spawn_in_process(HandlerRegistry::new(), 4);
    host.abort();
    let _ = host.await;
    let client = QueryClient::with_config(Arc::new(bridge), CacheConfig::default());

    let result = client.query(Operation::AccountsList, json!({})).await;
    assert_transport(&result);
    assert!(client
        .snapshot(Operation::AccountsList, &json!({}))
        .unwrap()
        .data
        .is_none());
}
