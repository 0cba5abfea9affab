//! Immutable allow-list of bridge operations.
//!
//! The allow-list is the capability boundary between the UI and the
//! privileged host. It is computed once and never mutated afterwards; any
//! name it does not contain is rejected before anything crosses the
//! boundary.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;

use crate::error::BridgeError;
use crate::operation::{Domain, Operation};

static STANDARD: Lazy<AllowList> = Lazy::new(|| AllowList::from_operations(Operation::ALL));

/// Fixed set of operations that may cross the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    operations: BTreeSet<Operation>,
}

impl AllowList {
    /// The full declared surface, computed on first use.
    pub fn standard() -> &'static AllowList {
        &STANDARD
    }

    /// Build a deliberate subset of the declared surface.
    pub fn from_operations(operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
        }
    }

    /// Look up a raw name, returning the operation only if it is allowed.
    pub fn resolve(&self, name: &str) -> Option<Operation> {
        let operation = name.parse::<Operation>().ok()?;
        self.operations.contains(&operation).then_some(operation)
    }

    /// Like [`AllowList::resolve`] but yields the rejection error.
    pub fn authorize(&self, name: &str) -> Result<Operation, BridgeError> {
        self.resolve(name)
            .ok_or_else(|| BridgeError::Unauthorized {
                operation: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn allows(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Allowed operations in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        self.operations.iter().copied()
    }

    /// Wire names grouped under their domain, for audits and docs.
    pub fn grouped(&self) -> Vec<(Domain, Vec<&'static str>)> {
        Domain::ALL
            .into_iter()
            .filter_map(|domain| {
                let names: Vec<_> = self
                    .iter()
                    .filter(|op| op.domain() == domain)
                    .map(|op| op.as_str())
                    .collect();
                (!names.is_empty()).then_some((domain, names))
            })
            .collect()
    }
}
