//! WEFT Core - Operation catalogue and contract types
//!
//! Everything the renderer and the privileged host agree on: the closed set
//! of operations, the allow-list that gates them, cache keys, the write
//! envelope, list filtering, money handling and the business payloads.
//! No I/O lives here.

pub mod allow_list;
pub mod calls;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod key;
pub mod money;
pub mod operation;
pub mod transport;

pub use allow_list::AllowList;
pub use calls::{Call, ReadCall, WriteCall};
pub use envelope::{MutationOutcome, MutationResponse};
pub use error::{BridgeError, CacheError, ValidationError, WeftError, WeftResult};
pub use filter::{FilterSpec, ListFilter, SEARCH_ARG};
pub use key::{canonicalize, KeyScope, QueryKey};
pub use money::{DecimalError, Money, Rate};
pub use operation::{Domain, Operation, OperationKind, StaleClass, UnknownOperation};
pub use transport::{Transport, TransportMode};
