//! Response envelope normalization.
//!
//! The remote API wraps payloads inconsistently: bare arrays, `{data: [...]}`,
//! `{items: [...]}`, `{produtos: [...]}`, sometimes `{data: {items: [...]}}`.
//! Every response passes through here once so callers only ever see the
//! payload itself.

use serde_json::Value;

/// Keys that may carry a list payload, in lookup order.
const LIST_KEYS: &[&str] = &[
    "data",
    "items",
    "produtos",
    "products",
    "categorias",
    "categories",
    "results",
    "rows",
];

/// Extract the list payload from `value`.
///
/// Accepts a bare array, or an object carrying the array under one of
/// [`LIST_KEYS`], looking one level deeper when the wrapper is itself an
/// object (`{data: {items: [...]}}`). Anything else yields an empty list.
#[must_use]
pub fn normalize_list(value: Value) -> Vec<Value> {
    normalize_list_at_depth(value, 0)
}

fn normalize_list_at_depth(value: Value, depth: u8) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut fields) if depth < 2 => {
            for key in LIST_KEYS {
                match fields.remove(*key) {
                    Some(Value::Array(items)) => return items,
                    Some(nested @ Value::Object(_)) => {
                        let items = normalize_list_at_depth(nested, depth + 1);
                        if !items.is_empty() {
                            return items;
                        }
                    }
                    _ => {}
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Extract a single-record payload from `value`.
///
/// Returns the object under the first of `keys` that holds one, otherwise
/// `value` itself when it is an object. Non-objects yield `None`.
#[must_use]
pub fn normalize_record(value: Value, keys: &[&str]) -> Option<Value> {
    let Value::Object(mut fields) = value else {
        return None;
    };

    for key in keys {
        if let Some(Value::Object(inner)) = fields.remove(*key) {
            return Some(Value::Object(inner));
        }
    }

    Some(Value::Object(fields))
}

/// Decode each element, skipping (and logging) the ones that don't fit `T`.
pub fn decode_each<T: serde::de::DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, what, "Skipping undecodable record");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::warn!(
            what,
            skipped = total - decoded.len(),
            total,
            "Some records could not be decoded"
        );
    }
    decoded
}
