//! WEFT Fixtures - Offline demo data
//!
//! When the privileged host is absent the data-access layer serves every read
//! from a deterministic [`FixtureSet`], filtered with the same predicates as
//! the real handlers, and acknowledges every write without persisting it.

pub mod analytics;
pub mod data;
pub mod set;
pub mod transport;

pub use set::{FixtureSet, BASE_CURRENCY};
pub use transport::{FixtureTransport, DEFAULT_LATENCY};
