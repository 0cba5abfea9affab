use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use weft_core::{Operation, OperationKind};
use weft_query::{CacheConfig, QueryClient, QueryStatus};
use weft_test_utils::{generators, SpyTransport};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn reads() -> impl Iterator<Item = Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| op.kind() == OperationKind::Read)
}

proptest! {
    /// An accepted write marks stale exactly the reads in its declared
    /// namespaces and nothing else.
    #[test]
    fn accepted_write_invalidates_exactly_its_namespaces(
        write in generators::arb_write_operation(),
    ) {
        runtime().block_on(async {
            let spy = Arc::new(SpyTransport::new());
            let client = QueryClient::with_config(spy, CacheConfig::default());
            for read in reads() {
                client.query(read, json!({})).await.unwrap();
            }

            client.mutate(write, json!({})).await.unwrap();

            for read in reads() {
                let status = client.snapshot(read, &json!({})).unwrap().status;
                let expected = if write.invalidates().contains(&read.domain()) {
                    QueryStatus::Stale
                } else {
                    QueryStatus::Fresh
                };
                assert_eq!(status, expected, "{} after {}", read, write);
            }
        });
    }

    /// A refused write never changes any cached status.
    #[test]
    fn refused_write_invalidates_nothing(write in generators::arb_write_operation()) {
        runtime().block_on(async {
            let spy = Arc::new(SpyTransport::new());
            spy.set_response(write, json!({"success": false, "error": "refused"}));
            let client = QueryClient::with_config(spy.clone(), CacheConfig::default());
            for read in reads() {
                client.query(read, json!({})).await.unwrap();
            }

            let response = client.mutate(write, json!({})).await.unwrap();
            assert!(!response.success);

            for read in reads() {
                let status = client.snapshot(read, &json!({})).unwrap().status;
                assert_eq!(status, QueryStatus::Fresh, "{} after refused {}", read, write);
            }
            assert_eq!(client.stats().unwrap().invalidations, 0);
        });
    }

    /// Only arguments that serialize to the same key share a cache entry.
    #[test]
    fn only_equal_arguments_share_an_entry(args in generators::arb_args()) {
        runtime().block_on(async {
            let spy = Arc::new(SpyTransport::new());
            let client = QueryClient::with_config(spy.clone(), CacheConfig::default());
            let is_empty = args.as_object().is_some_and(|map| map.is_empty());

            client.query(Operation::AccountsList, args).await.unwrap();
            client.query(Operation::AccountsList, json!({})).await.unwrap();

            let expected = if is_empty { 1 } else { 2 };
            assert_eq!(spy.call_count(Operation::AccountsList), expected);
        });
    }
}
