//! The seam between the query layer and whatever answers operations.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::WeftResult;
use crate::operation::Operation;

/// Which kind of transport is serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    /// Requests cross the allow-listed bridge to the privileged host.
    Bridge,
    /// Requests are answered from in-memory demo fixtures.
    Fixture,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Bridge => "bridge",
            TransportMode::Fixture => "fixture",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can answer an operation with a JSON payload.
///
/// Reads return the bare payload. Writes return a serialized
/// [`crate::MutationResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    fn mode(&self) -> TransportMode;

    async fn invoke(&self, operation: Operation, args: Value) -> WeftResult<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn mode(&self) -> TransportMode {
        (**self).mode()
    }

    async fn invoke(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        (**self).invoke(operation, args).await
    }
}
