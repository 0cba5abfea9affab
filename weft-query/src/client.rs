//! The query client: cached reads, invalidating writes.
//!
//! Reads go through the [`QueryCache`]: a fresh entry answers directly,
//! concurrent reads of one key share a single transport call, and failures
//! are recorded without discarding the last good data. Writes go straight to
//! the transport. Only an acknowledged write (`success: true`) marks the
//! namespaces it declares stale; a refusal or a transport failure leaves
//! every cache untouched. Nothing is retried.

use futures_util::future::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use weft_core::{
    AllowList, BridgeError, Call, KeyScope, MutationOutcome, MutationResponse, Operation,
    OperationKind, QueryKey, ReadCall, Transport, TransportMode, ValidationError, WeftResult,
    WriteCall,
};

use crate::freshness::{QueryRead, QuerySnapshot};
use crate::store::{CacheConfig, CacheStats, Lookup, QueryCache};

/// Releases a read's claim on an in-flight fetch when the read ends,
/// whether it settled or was dropped mid-flight.
struct PendingRead<'a> {
    cache: &'a QueryCache,
    key: &'a QueryKey,
    seq: u64,
}

impl Drop for PendingRead<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.cache.release(self.key, self.seq) {
            warn!(key = %self.key, error = %err, "failed to release fetch");
        }
    }
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    cache: Arc<QueryCache>,
}

/// Cheaply cloneable handle over a transport and a cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("mode", &self.inner.transport.mode())
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<QueryCache>) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport, cache }),
        }
    }

    /// Client with a private cache built from `config`.
    pub fn with_config(transport: Arc<dyn Transport>, config: CacheConfig) -> Self {
        Self::new(transport, Arc::new(QueryCache::new(config)))
    }

    pub fn mode(&self) -> TransportMode {
        self.inner.transport.mode()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Read `operation`, answering from the cache while fresh.
    pub async fn query(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        Ok(self.load(operation, args, false).await?.into_value())
    }

    /// Fetch again even if the cached value is fresh.
    pub async fn refetch(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        Ok(self.load(operation, args, true).await?.into_value())
    }

    /// Typed read. Validates and encodes `call`, then decodes the payload.
    pub async fn fetch<R: ReadCall>(&self, call: &R) -> WeftResult<QueryRead<R::Output>> {
        let args = encode(call)?;
        let read = self.load(R::OPERATION, args, false).await?;
        Ok(read.try_map(|value| decode(R::OPERATION, value))?)
    }

    async fn load(
        &self,
        operation: Operation,
        args: Value,
        force: bool,
    ) -> WeftResult<QueryRead<Value>> {
        ensure_kind(operation, OperationKind::Read)?;
        let key = QueryKey::new(operation, &args);
        let transport = Arc::clone(&self.inner.transport);
        let lookup = self.inner.cache.begin(&key, force, move || {
            async move { transport.invoke(operation, args).await }.boxed()
        })?;
        let (seq, fetch) = match lookup {
            Lookup::Hit(read) => return Ok(read),
            Lookup::Pending { seq, fetch } => (seq, fetch),
        };
        let _pending = PendingRead {
            cache: &self.inner.cache,
            key: &key,
            seq,
        };
        let result = fetch.await;
        self.inner.cache.settle(&key, seq, &result)?;
        result.map(QueryRead::from_transport)
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Send a write and, if the host accepts it, invalidate what it declares.
    ///
    /// A refusal comes back as `Ok` with `success: false`.
    pub async fn mutate(&self, operation: Operation, args: Value) -> WeftResult<MutationResponse> {
        ensure_kind(operation, OperationKind::Write)?;
        let raw = match self.inner.transport.invoke(operation, args).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(operation = %operation, error = %err, "mutation failed, caches untouched");
                return Err(err);
            }
        };
        let response = MutationResponse::from_value(operation.as_str(), raw)?;
        if response.is_success() {
            let scopes: Vec<KeyScope> = operation
                .invalidates()
                .iter()
                .copied()
                .map(KeyScope::Namespace)
                .collect();
            self.invalidate_scopes(&scopes)?;
        } else {
            debug!(
                operation = %operation,
                error = response.error.as_deref().unwrap_or_default(),
                "mutation refused"
            );
        }
        Ok(response)
    }

    /// Typed write. Validates and encodes `call`, then decodes `data`.
    pub async fn submit<W: WriteCall>(&self, call: &W) -> WeftResult<MutationOutcome<W::Output>> {
        let args = encode(call)?;
        let response = self.mutate(W::OPERATION, args).await?;
        Ok(response.into_outcome(W::OPERATION.as_str())?)
    }

    /// Call an operation by name.
    ///
    /// Names outside the allow-list fail as unauthorized. Reads are cached;
    /// writes return their envelope as JSON.
    pub async fn call(&self, name: &str, args: Value) -> WeftResult<Value> {
        let operation = AllowList::standard().authorize(name)?;
        match operation.kind() {
            OperationKind::Read => self.query(operation, args).await,
            OperationKind::Write => Ok(self.mutate(operation, args).await?.into_value()),
        }
    }

    // ========================================================================
    // CACHE CONTROL
    // ========================================================================

    /// Mark every key in `scope` stale. Returns how many entries it touched.
    pub fn invalidate(&self, scope: impl Into<KeyScope>) -> WeftResult<usize> {
        self.invalidate_scopes(&[scope.into()])
    }

    fn invalidate_scopes(&self, scopes: &[KeyScope]) -> WeftResult<usize> {
        let mut touched = 0;
        let mut active = Vec::new();
        for scope in scopes {
            for (key, is_active) in self.inner.cache.invalidate(scope)? {
                touched += 1;
                if is_active {
                    active.push(key);
                }
            }
        }
        if self.inner.cache.config().refetch_active_on_invalidate {
            for key in active {
                self.spawn_refetch(key);
            }
        }
        Ok(touched)
    }

    /// Refetch `key` in the background. The outcome lands in the cache and
    /// reaches watchers through their snapshots.
    ///
    /// Outside a tokio runtime nothing is spawned and `None` is returned; the
    /// key stays stale until the next read.
    pub fn spawn_refetch(&self, key: QueryKey) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            debug!(key = %key, "no runtime, background refetch skipped");
            return None;
        };
        let client = self.clone();
        Some(runtime.spawn(async move {
            debug!(key = %key, "background refetch");
            if let Err(err) = client.load(key.operation(), key.args_value(), true).await {
                debug!(key = %key, error = %err, "background refetch failed");
            }
        }))
    }

    pub fn snapshot(&self, operation: Operation, args: &Value) -> WeftResult<QuerySnapshot> {
        Ok(self.inner.cache.snapshot(&QueryKey::new(operation, args))?)
    }

    /// Subscribe to a key. While the receiver lives the key is active: it
    /// is refetched after invalidation and never evicted.
    pub fn watch(
        &self,
        operation: Operation,
        args: &Value,
    ) -> WeftResult<watch::Receiver<QuerySnapshot>> {
        ensure_kind(operation, OperationKind::Read)?;
        Ok(self.inner.cache.watch(&QueryKey::new(operation, args))?)
    }

    pub fn stats(&self) -> WeftResult<CacheStats> {
        Ok(self.inner.cache.stats()?)
    }

    /// Drop every cached entry, e.g. after logout.
    pub fn clear(&self) -> WeftResult<usize> {
        Ok(self.inner.cache.clear()?)
    }
}

fn ensure_kind(operation: Operation, expected: OperationKind) -> Result<(), ValidationError> {
    if operation.kind() == expected {
        Ok(())
    } else {
        Err(ValidationError::WrongOperationKind {
            operation,
            expected,
        })
    }
}

fn encode<C: Call>(call: &C) -> WeftResult<Value> {
    call.validate()?;
    let args = serde_json::to_value(call).map_err(|e| ValidationError::InvalidValue {
        field: C::OPERATION.to_string(),
        reason: e.to_string(),
    })?;
    Ok(match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

fn decode<T: DeserializeOwned>(operation: Operation, value: Value) -> Result<T, BridgeError> {
    serde_json::from_value(value).map_err(|e| BridgeError::malformed(operation.as_str(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::QueryStatus;
    use serde_json::json;
    use weft_core::calls::{GetSession, ListAccounts, Logout};
    use weft_core::entities::Account;
    use weft_test_utils::SpyTransport;

    fn client() -> (QueryClient, Arc<SpyTransport>) {
        let spy = Arc::new(SpyTransport::new());
        let client = QueryClient::with_config(spy.clone(), CacheConfig::default());
        (client, spy)
    }

    #[tokio::test]
    async fn test_query_rejects_writes() {
        let (client, spy) = client();
        let err = client
            .query(Operation::AccountsCreate, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            weft_core::WeftError::Validation(ValidationError::WrongOperationKind { .. })
        ));
        assert_eq!(spy.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_mutate_rejects_reads() {
        let (client, spy) = client();
        assert!(client.mutate(Operation::AccountsList, json!({})).await.is_err());
        assert_eq!(spy.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_call_by_name() {
        let (client, spy) = client();
        spy.set_response(Operation::AccountsList, json!([{"id": "1"}]));

        let rows = client.call("accounts:list", json!({})).await.unwrap();
        assert_eq!(rows, json!([{"id": "1"}]));

        let ack = client.call("auth:logout", json!({})).await.unwrap();
        assert_eq!(ack, json!({"success": true}));

        let denied = client.call("accounts:delete", json!({})).await;
        assert!(denied.unwrap_err().is_unauthorized());
        assert_eq!(spy.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_decodes_typed_rows() {
        let (client, spy) = client();
        spy.set_response(Operation::AccountsList, json!([]));
        let read = client
            .fetch(&ListAccounts {
                search: Some("yildiz".to_string()),
                account_type: None,
            })
            .await
            .unwrap();
        let rows: &Vec<Account> = read.value();
        assert!(rows.is_empty());
        assert!(!read.was_cache_hit());
        assert_eq!(spy.calls()[0].args, json!({"search": "yildiz"}));
    }

    #[tokio::test]
    async fn test_fetch_reports_malformed_payload() {
        let (client, spy) = client();
        spy.set_response(Operation::AuthSession, json!({"unexpected": true}));
        let err = client.fetch(&GetSession {}).await.unwrap_err();
        assert!(matches!(
            err,
            weft_core::WeftError::Bridge(BridgeError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_without_data_is_applied() {
        let (client, _spy) = client();
        let outcome = client.submit(&Logout {}).await.unwrap();
        assert!(outcome.is_applied());
    }

    #[tokio::test]
    async fn test_clear_drops_entries() {
        let (client, _spy) = client();
        client.query(Operation::AccountsList, json!({})).await.unwrap();
        assert_eq!(client.clear().unwrap(), 1);
        assert_eq!(
            client
                .snapshot(Operation::AccountsList, &json!({}))
                .unwrap()
                .status,
            QueryStatus::Idle
        );
    }
}
