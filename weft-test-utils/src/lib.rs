//! WEFT Test Utilities
//!
//! Shared test infrastructure for the weft workspace:
//! - Spy transport with scripted responses and call recording
//! - Spy IPC channel and counting privileged handlers
//! - Proptest generators for operations, names and arguments
//! - Assertions for weft error variants

pub use weft_core::{
    BridgeError, Domain, MutationResponse, Operation, OperationKind, QueryKey, Transport,
    TransportMode, WeftError, WeftResult,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weft_bridge::{BridgeChannel, Handler, HandlerRegistry, HandlerResult};

// ============================================================================
// SPY TRANSPORT
// ============================================================================

/// One call observed by a spy.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub args: Value,
}

#[derive(Debug)]
struct Scripted {
    delay: Duration,
    result: WeftResult<Value>,
}

#[derive(Debug, Default)]
struct SpyState {
    calls: Vec<RecordedCall>,
    scripted: HashMap<Operation, VecDeque<Scripted>>,
    responses: HashMap<Operation, WeftResult<Value>>,
    delay: Duration,
}

/// Transport that records every call and answers from a script.
///
/// Answer precedence: a queued one-shot script for the operation, then a
/// persistent response, then a default (`[]` for reads, `{"success":true}`
/// for writes).
#[derive(Debug)]
pub struct SpyTransport {
    mode: TransportMode,
    state: Mutex<SpyState>,
}

impl Default for SpyTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SpyTransport {
    pub fn new() -> Self {
        Self::with_mode(TransportMode::Bridge)
    }

    pub fn with_mode(mode: TransportMode) -> Self {
        Self {
            mode,
            state: Mutex::new(SpyState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SpyState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer every call to `operation` with `value`.
    pub fn set_response(&self, operation: Operation, value: Value) -> &Self {
        self.state().responses.insert(operation, Ok(value));
        self
    }

    /// Fail every call to `operation` with `error`.
    pub fn set_failure(&self, operation: Operation, error: WeftError) -> &Self {
        self.state().responses.insert(operation, Err(error));
        self
    }

    /// Answer the next call to `operation` with `result` after `delay`.
    pub fn enqueue(&self, operation: Operation, delay: Duration, result: WeftResult<Value>) -> &Self {
        self.state()
            .scripted
            .entry(operation)
            .or_default()
            .push_back(Scripted { delay, result });
        self
    }

    /// Delay applied to unscripted answers.
    pub fn set_delay(&self, delay: Duration) -> &Self {
        self.state().delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }

    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }

    fn next_answer(&self, operation: Operation, args: &Value) -> (Duration, WeftResult<Value>) {
        let mut state = self.state();
        state.calls.push(RecordedCall {
            operation,
            args: args.clone(),
        });
        if let Some(scripted) = state
            .scripted
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            return (scripted.delay, scripted.result);
        }
        let delay = state.delay;
        let result = match state.responses.get(&operation) {
            Some(result) => result.clone(),
            None if operation.is_mutation() => Ok(MutationResponse::ok().into_value()),
            None => Ok(json!([])),
        };
        (delay, result)
    }
}

#[async_trait]
impl Transport for SpyTransport {
    fn mode(&self) -> TransportMode {
        self.mode
    }

    async fn invoke(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        let (delay, result) = self.next_answer(operation, &args);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

// ============================================================================
// SPY CHANNEL AND COUNTING HANDLERS
// ============================================================================

/// IPC channel stand-in that records what crossed the gate.
#[derive(Debug, Clone, Default)]
pub struct SpyChannel {
    seen: Arc<Mutex<Vec<RecordedCall>>>,
}

impl SpyChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<RecordedCall> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn seen_count(&self) -> usize {
        self.seen().len()
    }
}

#[async_trait]
impl BridgeChannel for SpyChannel {
    async fn call(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                operation,
                args: args.clone(),
            });
        Ok(json!({ "operation": operation.as_str(), "args": args }))
    }
}

/// Per-operation invocation counts shared by counting handlers.
#[derive(Debug, Default)]
pub struct CallLog {
    counts: Mutex<HashMap<Operation, usize>>,
    total: AtomicUsize,
}

impl CallLog {
    fn record(&self, operation: Operation) {
        *self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(operation)
            .or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Handler that logs its invocation and echoes the operation name.
pub struct CountingHandler {
    operation: Operation,
    log: Arc<CallLog>,
}

impl CountingHandler {
    pub fn new(operation: Operation, log: Arc<CallLog>) -> Self {
        Self { operation, log }
    }
}

#[async_trait]
impl Handler for CountingHandler {
    async fn handle(&self, args: Value) -> HandlerResult {
        self.log.record(self.operation);
        let payload = json!({ "operation": self.operation.as_str(), "args": args });
        if self.operation.is_mutation() {
            Ok(MutationResponse::ok_with(payload).into_value())
        } else {
            Ok(payload)
        }
    }
}

/// Registry with a counting handler bound to every declared operation.
pub fn counting_registry() -> (HandlerRegistry, Arc<CallLog>) {
    let log = Arc::new(CallLog::default());
    let mut registry = HandlerRegistry::new();
    for operation in Operation::ALL {
        registry.register(operation, CountingHandler::new(operation, log.clone()));
    }
    (registry, log)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for weft types.

    use super::*;
    use proptest::prelude::*;

    /// Any declared operation.
    pub fn arb_operation() -> impl Strategy<Value = Operation> {
        proptest::sample::select(Operation::ALL.to_vec())
    }

    /// Any declared read.
    pub fn arb_read_operation() -> impl Strategy<Value = Operation> {
        let reads: Vec<_> = Operation::ALL.into_iter().filter(|op| op.is_read()).collect();
        proptest::sample::select(reads)
    }

    /// Any declared write.
    pub fn arb_write_operation() -> impl Strategy<Value = Operation> {
        let writes: Vec<_> = Operation::ALL
            .into_iter()
            .filter(|op| op.is_mutation())
            .collect();
        proptest::sample::select(writes)
    }

    /// Names shaped like operations that are not declared.
    pub fn arb_undeclared_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,12}:[a-zA-Z]{1,16}",
            "\\PC{0,32}",
            arb_operation().prop_map(|op| op.as_str().to_uppercase()),
            arb_operation().prop_map(|op| format!("{} ", op)),
            arb_operation().prop_map(|op| format!("{}Archive", op)),
        ]
        .prop_filter("must not be declared", |name| name.parse::<Operation>().is_err())
    }

    /// Flat argument objects of scalar values.
    pub fn arb_args() -> impl Strategy<Value = Value> {
        let scalar = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-1000i64..1000).prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        ];
        prop::collection::btree_map("[a-z][a-zA-Z]{0,8}", scalar, 0..5)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for weft error variants.

    use super::*;

    /// Assert that a result is an allow-list rejection naming `name`.
    #[track_caller]
    pub fn assert_unauthorized<T: std::fmt::Debug>(result: &WeftResult<T>, name: &str) {
        match result {
            Err(WeftError::Bridge(BridgeError::Unauthorized { operation })) => {
                assert_eq!(operation, name, "Wrong operation in Unauthorized error");
            }
            other => panic!("Expected Unauthorized error for {}, got: {:?}", name, other),
        }
    }

    /// Assert that a result is a transport failure.
    #[track_caller]
    pub fn assert_transport<T: std::fmt::Debug>(result: &WeftResult<T>) {
        match result {
            Err(WeftError::Bridge(BridgeError::Transport { .. })) => {}
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    /// Assert that a result is a remote handler failure.
    #[track_caller]
    pub fn assert_remote<T: std::fmt::Debug>(result: &WeftResult<T>) {
        match result {
            Err(WeftError::Bridge(BridgeError::Remote { .. })) => {}
            other => panic!("Expected Remote error, got: {:?}", other),
        }
    }

    /// Assert that a result is a validation error.
    #[track_caller]
    pub fn assert_validation<T: std::fmt::Debug>(result: &WeftResult<T>) {
        match result {
            Err(WeftError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }
}
