//! WEFT Bridge - Allow-listed renderer-to-host calls
//!
//! Three pieces:
//! - [`Bridge`]: the gate. Rejects any name outside the allow-list and
//!   forwards everything else untouched.
//! - [`IpcChannel`]: bounded request queue with per-request reply slots.
//! - [`PrivilegedHost`]: drains the queue and runs registered handlers.

pub mod gate;
pub mod host;
pub mod ipc;

pub use gate::Bridge;
pub use host::{FnHandler, Handler, HandlerError, HandlerRegistry, HandlerResult, PrivilegedHost};
pub use ipc::{ipc_channel, BridgeChannel, IpcChannel, IpcReceiver, IpcRequest, DEFAULT_CHANNEL_CAPACITY};

use tokio::task::JoinHandle;

/// Wire a bridge to a host running in this process.
pub fn spawn_in_process(registry: HandlerRegistry, capacity: usize) -> (Bridge, JoinHandle<()>) {
    let (bridge, receiver) = Bridge::ipc(capacity);
    let handle = PrivilegedHost::new(registry).spawn(receiver);
    (bridge, handle)
}
