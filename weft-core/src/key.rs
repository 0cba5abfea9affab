//! Hierarchical query keys.
//!
//! A [`QueryKey`] identifies one cached read: the operation plus its
//! canonically serialized arguments. Invalidation targets a [`KeyScope`],
//! which is an explicit hierarchy rather than a string prefix, so
//! `"accounts"` can never accidentally match `"accountsArchive"`.

use serde_json::{Map, Value};
use std::fmt;

use crate::operation::{Domain, Operation};

/// Identity of a cached read.
///
/// Two calls with equal operation and equal arguments (regardless of object
/// key order) produce equal keys. `null` arguments are treated as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    operation: Operation,
    args: String,
}

impl QueryKey {
    pub fn new(operation: Operation, args: &Value) -> Self {
        Self {
            operation,
            args: canonical_string(args),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Namespace the key lives under.
    pub fn namespace(&self) -> Domain {
        self.operation.domain()
    }

    /// Canonical serialized arguments.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Arguments parsed back into a JSON value.
    pub fn args_value(&self) -> Value {
        serde_json::from_str(&self.args).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.args)
    }
}

/// Target of an invalidation, from broadest to narrowest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// Every cached key.
    All,
    /// Every key whose operation belongs to the domain.
    Namespace(Domain),
    /// Every key of one operation, with any arguments.
    Operation(Operation),
    /// One key.
    Exact(QueryKey),
}

impl KeyScope {
    pub fn contains(&self, key: &QueryKey) -> bool {
        match self {
            KeyScope::All => true,
            KeyScope::Namespace(domain) => key.namespace() == *domain,
            KeyScope::Operation(operation) => key.operation() == *operation,
            KeyScope::Exact(exact) => exact == key,
        }
    }
}

impl From<Domain> for KeyScope {
    fn from(domain: Domain) -> Self {
        KeyScope::Namespace(domain)
    }
}

impl From<Operation> for KeyScope {
    fn from(operation: Operation) -> Self {
        KeyScope::Operation(operation)
    }
}

impl From<QueryKey> for KeyScope {
    fn from(key: QueryKey) -> Self {
        KeyScope::Exact(key)
    }
}

impl fmt::Display for KeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyScope::All => f.write_str("*"),
            KeyScope::Namespace(domain) => write!(f, "{}:*", domain),
            KeyScope::Operation(operation) => write!(f, "{} *", operation),
            KeyScope::Exact(key) => write!(f, "{}", key),
        }
    }
}

/// Rebuild a value with object keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn canonical_string(args: &Value) -> String {
    match args {
        Value::Null => "{}".to_string(),
        other => canonicalize(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a = QueryKey::new(
            Operation::OrdersList,
            &json!({"status": "SHIPPED", "accountId": "1"}),
        );
        let b = QueryKey::new(
            Operation::OrdersList,
            &json!({"accountId": "1", "status": "SHIPPED"}),
        );
        assert_eq!(a, b);
        assert_eq!(a.args(), r#"{"accountId":"1","status":"SHIPPED"}"#);
    }

    #[test]
    fn test_null_and_empty_object_are_equal() {
        assert_eq!(
            QueryKey::new(Operation::AccountsList, &Value::Null),
            QueryKey::new(Operation::AccountsList, &json!({}))
        );
    }

    #[test]
    fn test_different_args_are_different_keys() {
        assert_ne!(
            QueryKey::new(Operation::OrdersList, &json!({"status": "SHIPPED"})),
            QueryKey::new(Operation::OrdersList, &json!({"status": "PENDING"}))
        );
    }

    #[test]
    fn test_nested_objects_are_canonical() {
        let a = QueryKey::new(Operation::AccountsList, &json!({"page": {"size": 10, "index": 2}}));
        let b = QueryKey::new(Operation::AccountsList, &json!({"page": {"index": 2, "size": 10}}));
        assert_eq!(a, b);
        assert_eq!(a.args_value()["page"]["index"], 2);
    }

    #[test]
    fn test_scope_hierarchy() {
        let shipped = QueryKey::new(Operation::OrdersList, &json!({"status": "SHIPPED"}));
        let detail = QueryKey::new(Operation::OrdersGet, &json!({"id": "7"}));
        let accounts = QueryKey::new(Operation::AccountsList, &json!({}));

        let namespace = KeyScope::from(Domain::Orders);
        assert!(namespace.contains(&shipped));
        assert!(namespace.contains(&detail));
        assert!(!namespace.contains(&accounts));

        let operation = KeyScope::from(Operation::OrdersList);
        assert!(operation.contains(&shipped));
        assert!(!operation.contains(&detail));

        let exact = KeyScope::from(shipped.clone());
        assert!(exact.contains(&shipped));
        assert!(!exact.contains(&QueryKey::new(Operation::OrdersList, &json!({}))));

        assert!(KeyScope::All.contains(&accounts));
    }

    #[test]
    fn test_display() {
        let key = QueryKey::new(Operation::AccountsList, &json!({"type": "CUSTOMER"}));
        assert_eq!(key.to_string(), r#"accounts:list {"type":"CUSTOMER"}"#);
        assert_eq!(KeyScope::Namespace(Domain::Orders).to_string(), "orders:*");
    }
}
