//! Renderer-side IPC channel to the privileged host.
//!
//! Requests travel over a bounded mpsc queue and carry their own oneshot
//! reply slot. The channel knows nothing about the allow-list; that check
//! happens in [`crate::Bridge`] before a request is built.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;
use weft_core::{BridgeError, Operation, WeftResult};

/// Default capacity of the request queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// One call in flight to the host.
#[derive(Debug)]
pub struct IpcRequest {
    pub request_id: Uuid,
    pub operation: Operation,
    pub args: Value,
    reply: oneshot::Sender<WeftResult<Value>>,
}

impl IpcRequest {
    pub fn new(operation: Operation, args: Value) -> (Self, oneshot::Receiver<WeftResult<Value>>) {
        let (reply, rx) = oneshot::channel();
        let request = Self {
            request_id: Uuid::now_v7(),
            operation,
            args,
            reply,
        };
        (request, rx)
    }

    /// Answer the request. Returns false if the caller already gave up.
    pub fn respond(self, result: WeftResult<Value>) -> bool {
        self.reply.send(result).is_ok()
    }
}

/// Anything that can carry an already-authorized call to the host.
#[async_trait]
pub trait BridgeChannel: Send + Sync {
    async fn call(&self, operation: Operation, args: Value) -> WeftResult<Value>;
}

/// Sender half of the IPC queue.
#[derive(Debug, Clone)]
pub struct IpcChannel {
    sender: mpsc::Sender<IpcRequest>,
}

/// Receiver half, consumed by [`crate::PrivilegedHost::serve`].
#[derive(Debug)]
pub struct IpcReceiver {
    receiver: mpsc::Receiver<IpcRequest>,
}

impl IpcReceiver {
    pub async fn recv(&mut self) -> Option<IpcRequest> {
        self.receiver.recv().await
    }

    /// Stop accepting new requests. Queued ones can still be drained.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Create a bounded IPC queue.
pub fn ipc_channel(capacity: usize) -> (IpcChannel, IpcReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (IpcChannel { sender }, IpcReceiver { receiver })
}

impl IpcChannel {
    /// True once the host side has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl BridgeChannel for IpcChannel {
    async fn call(&self, operation: Operation, args: Value) -> WeftResult<Value> {
        let (request, reply) = IpcRequest::new(operation, args);
        self.sender
            .send(request)
            .await
            .map_err(|_| BridgeError::transport(operation.as_str(), "host channel closed"))?;
        reply
            .await
            .map_err(|_| BridgeError::transport(operation.as_str(), "host dropped the reply"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_round_trip() {
        let (channel, mut receiver) = ipc_channel(4);
        let server = tokio::spawn(async move {
            let request = receiver.recv().await.unwrap();
            assert_eq!(request.operation, Operation::AccountsList);
            assert_eq!(request.request_id.get_version_num(), 7);
            let args = request.args.clone();
            request.respond(Ok(json!({"echo": args})));
        });

        let result = channel
            .call(Operation::AccountsList, json!({"search": "x"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"echo": {"search": "x"}}));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_host_is_transport_failure() {
        let (channel, receiver) = ipc_channel(4);
        drop(receiver);
        assert!(channel.is_closed());

        let err = channel.call(Operation::OrdersList, Value::Null).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_dropped_reply_is_transport_failure() {
        let (channel, mut receiver) = ipc_channel(4);
        tokio::spawn(async move {
            let request = receiver.recv().await.unwrap();
            drop(request);
        });

        let err = channel.call(Operation::OrdersList, Value::Null).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("orders:list"));
    }
}
