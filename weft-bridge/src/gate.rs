//! The allow-list gate.
//!
//! Every renderer call passes through [`Bridge::invoke`]. A name outside the
//! allow-list fails before a request is built, so the privileged side never
//! observes it. Allowed calls are forwarded with their arguments untouched
//! and the host's answer or failure is returned as-is.
//!
//! The gate holds no cache and emits no logs.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use weft_core::{AllowList, Operation, Transport, TransportMode, WeftResult};

use crate::ipc::{ipc_channel, BridgeChannel, IpcReceiver};

/// Allow-listed entry point to the privileged host.
#[derive(Clone)]
pub struct Bridge {
    allow_list: Arc<AllowList>,
    channel: Arc<dyn BridgeChannel>,
}

impl Bridge {
    /// Gate `channel` with the full declared allow-list.
    pub fn new(channel: impl BridgeChannel + 'static) -> Self {
        Self::with_allow_list(AllowList::standard().clone(), channel)
    }

    /// Gate `channel` with a deliberate subset of the allow-list.
    pub fn with_allow_list(allow_list: AllowList, channel: impl BridgeChannel + 'static) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
            channel: Arc::new(channel),
        }
    }

    /// Create a bridge over a fresh IPC queue and hand back the host end.
    pub fn ipc(capacity: usize) -> (Self, IpcReceiver) {
        let (channel, receiver) = ipc_channel(capacity);
        (Self::new(channel), receiver)
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Call a named operation.
    pub async fn invoke(&self, name: &str, args: Value) -> WeftResult<Value> {
        let operation = self.allow_list.authorize(name)?;
        self.channel.call(operation, args).await
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("allowed", &self.allow_list.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for Bridge {
    fn mode(&self) -> TransportMode {
        TransportMode::Bridge
    }

    async fn invoke(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        Bridge::invoke(self, operation.as_str(), args).await
    }
}
