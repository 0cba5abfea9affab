//! Privileged side of the bridge.
//!
//! The host drains the IPC queue and dispatches each request to the handler
//! registered for its operation, one task per request.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use weft_core::{BridgeError, Operation, WeftResult};

use crate::ipc::{IpcReceiver, IpcRequest};

/// Error raised by a privileged handler.
///
/// - `code` is a stable, machine-readable identifier (snake_case).
/// - `message` is what the renderer shows.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{message} ({code})")]
pub struct HandlerError {
    pub code: &'static str,
    pub message: String,
}

impl HandlerError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

pub type HandlerResult = Result<Value, HandlerError>;

/// A privileged procedure bound to one operation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, args: Value) -> HandlerResult;
}

/// Adapter turning an async closure into a [`Handler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, args: Value) -> HandlerResult {
        (self.0)(args).await
    }
}

/// Operation → handler table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Operation, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler, replacing any previous one for the operation.
    pub fn register(&mut self, operation: Operation, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.insert(operation, Arc::new(handler));
        self
    }

    /// Bind an async closure.
    pub fn register_fn<F, Fut>(&mut self, operation: Operation, f: F) -> &mut Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(operation, FnHandler(f))
    }

    pub fn get(&self, operation: Operation) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&operation).cloned()
    }

    pub fn contains(&self, operation: Operation) -> bool {
        self.handlers.contains_key(&operation)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Declared operations with no handler bound.
    pub fn missing(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| !self.handlers.contains_key(op))
            .collect()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<_> = self.handlers.keys().map(|op| op.as_str()).collect();
        operations.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("operations", &operations)
            .finish()
    }
}

/// Serves IPC requests from a [`HandlerRegistry`].
#[derive(Debug, Clone)]
pub struct PrivilegedHost {
    registry: Arc<HandlerRegistry>,
}

impl PrivilegedHost {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Run one request to completion.
    pub async fn dispatch(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        let Some(handler) = self.registry.get(operation) else {
            warn!(operation = %operation, "no handler registered");
            return Err(BridgeError::remote(
                operation.as_str(),
                "not_found",
                format!("no handler registered for '{}'", operation),
            )
            .into());
        };
        handler
            .handle(args)
            .await
            .map_err(|e| BridgeError::remote(operation.as_str(), e.code, e.message).into())
    }

    /// Drain `receiver` until every sender is gone.
    pub async fn serve(self, mut receiver: IpcReceiver) {
        while let Some(request) = receiver.recv().await {
            let host = self.clone();
            tokio::spawn(async move { host.answer(request).await });
        }
        debug!("ipc receiver closed, host stopping");
    }

    /// Spawn [`PrivilegedHost::serve`] on the current runtime.
    pub fn spawn(self, receiver: IpcReceiver) -> JoinHandle<()> {
        tokio::spawn(self.serve(receiver))
    }

    async fn answer(&self, mut request: IpcRequest) {
        let request_id = request.request_id;
        let operation = request.operation;
        debug!(request_id = %request_id, operation = %operation, "dispatching");
        let args = std::mem::take(&mut request.args);
        let result = self.dispatch(operation, args).await;
        if let Err(err) = &result {
            warn!(request_id = %request_id, operation = %operation, error = %err, "handler failed");
        }
        if !request.respond(result) {
            debug!(request_id = %request_id, operation = %operation, "caller went away before reply");
        }
    }
}
