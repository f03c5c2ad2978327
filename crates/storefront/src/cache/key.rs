//! Deterministic cache keys.

use serde_json::{Map, Value};

/// Key identifying one cacheable query and its parameters.
///
/// Variables are stored in canonical JSON form: object keys sorted at every
/// depth, so semantically identical variable sets always produce the same
/// key regardless of insertion order. A `null` variable set is treated as
/// the empty object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    query: String,
    variables: String,
}

impl CacheKey {
    /// Build a key from a namespace, query text, and variables.
    #[must_use]
    pub fn new(namespace: &str, query: &str, variables: &Value) -> Self {
        let variables = match variables {
            Value::Null => "{}".to_string(),
            other => canonicalize(other).to_string(),
        };

        Self {
            namespace: namespace.to_owned(),
            query: query.to_owned(),
            variables,
        }
    }

    /// Namespace of the client that owns this key.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Query identifier (query text or REST path template).
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Canonical JSON serialization of the variables.
    #[must_use]
    pub fn variables(&self) -> &str {
        &self.variables
    }
}

/// Rebuild `value` with object keys inserted in sorted order.
///
/// `serde_json::Map` keeps insertion order when the `preserve_order` feature is
/// enabled anywhere in the build, so sorting explicitly keeps keys stable.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
