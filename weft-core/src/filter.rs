//! List filter predicates shared by fixture data and real handlers.
//!
//! A list read declares which fields its `search` argument scans and which
//! arguments must match a field exactly. Both the fixture transport and host
//! handlers evaluate the same [`ListFilter`], so results against fixtures
//! describe real-backend behaviour.

use serde_json::Value;

/// Name of the free-text search argument.
pub const SEARCH_ARG: &str = "search";

/// Declared filter shape of a list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    /// Fields scanned by a case-insensitive substring search.
    pub search_fields: &'static [&'static str],
    /// Fields compared for exact equality with the same-named argument.
    pub equality_fields: &'static [&'static str],
}

impl FilterSpec {
    pub const fn new(
        search_fields: &'static [&'static str],
        equality_fields: &'static [&'static str],
    ) -> Self {
        Self {
            search_fields,
            equality_fields,
        }
    }
}

/// A filter bound to concrete call arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    needle: Option<String>,
    search_fields: &'static [&'static str],
    equals: Vec<(&'static str, String)>,
}

impl ListFilter {
    /// Bind a filter spec to call arguments.
    ///
    /// A missing, `null` or empty-string argument disables its predicate.
    pub fn from_args(spec: FilterSpec, args: &Value) -> Self {
        let needle = args
            .get(SEARCH_ARG)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty() && !spec.search_fields.is_empty())
            .map(str::to_lowercase);

        let equals = spec
            .equality_fields
            .iter()
            .filter_map(|field| {
                let wanted = args.get(*field).and_then(scalar_text)?;
                (!wanted.is_empty()).then_some((*field, wanted))
            })
            .collect();

        Self {
            needle,
            search_fields: spec.search_fields,
            equals,
        }
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.needle.is_none() && self.equals.is_empty()
    }

    /// Evaluate the filter against one serialized record.
    pub fn matches(&self, item: &Value) -> bool {
        let search_ok = match &self.needle {
            None => true,
            Some(needle) => self.search_fields.iter().any(|field| {
                item.get(*field)
                    .and_then(Value::as_str)
                    .map(|text| text.to_lowercase().contains(needle.as_str()))
                    .unwrap_or(false)
            }),
        };

        search_ok
            && self.equals.iter().all(|(field, wanted)| {
                item.get(*field)
                    .and_then(scalar_text)
                    .map(|actual| actual == *wanted)
                    .unwrap_or(false)
            })
    }

    /// Keep only the matching records, preserving order.
    pub fn apply(&self, items: Vec<Value>) -> Vec<Value> {
        if self.is_empty() {
            return items;
        }
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

/// Render a JSON scalar for equality comparison (`"1"` equals `1`).
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
