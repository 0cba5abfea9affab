//! WEFT Query - Cached data access over the bridge
//!
//! Every backend operation is either a cached read or an invalidating write.
//! The [`QueryClient`] talks to one [`weft_core::Transport`], chosen once at
//! startup by [`select_transport`]: the allow-listed bridge when the
//! privileged host is present, the demo fixtures otherwise.
//!
//! ```ignore
//! let config = ClientConfig::load()?;
//! let transport = select_transport(bridge, FixtureSet::demo(), &config.demo);
//! let client = QueryClient::with_config(transport, config.cache_config());
//!
//! let shipped = client
//!     .query(Operation::OrdersList, json!({ "status": "SHIPPED" }))
//!     .await?;
//! client
//!     .mutate(Operation::OrdersUpdateStatus, json!({ "id": "O-1", "status": "DELIVERED" }))
//!     .await?;
//! // orders:* is now stale; the next read of `shipped` refetches.
//! ```

pub mod client;
pub mod config;
pub mod freshness;
pub mod selection;
pub mod store;
pub mod telemetry;

pub use client::QueryClient;
pub use config::{ClientConfig, ConfigError, DemoConfig};
pub use freshness::{QueryRead, QuerySnapshot, QueryStatus, Staleness};
pub use selection::select_transport;
pub use store::{CacheConfig, CacheStats, QueryCache, DEFAULT_MAX_ENTRIES};
pub use telemetry::{init_tracing, TelemetryError};
