//! Flattens the nested `metadata.abbreviations` mapping into one lookup
//! table.
//!
//! ```yaml
//! abbreviations:
//!   courts:
//!     georgia:
//!       Court of Appeals of Georgia: Ga. Ct. App.
//!   reporters:
//!     South Eastern Reporter: S.E.
//! ```
//!
//! Group names only organize the file; every string leaf becomes an entry
//! keyed by its lowercased name.

use std::collections::BTreeMap;

use serde_json::Value;

pub type AbbreviationTable = BTreeMap<String, String>;

/// Walks `value` depth-first without recursion. When a name appears more
/// than once, the first leaf in document order wins.
pub fn flatten(value: &Value) -> AbbreviationTable {
    let mut table = AbbreviationTable::new();
    let mut stack: Vec<(Option<&str>, &Value)> = vec![(None, value)];

    while let Some((key, node)) = stack.pop() {
        match node {
            Value::Object(map) => {
                for (k, v) in map.iter().rev() {
                    stack.push((Some(k.as_str()), v));
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev() {
                    stack.push((key, item));
                }
            }
            Value::String(s) => insert(&mut table, key, s.clone()),
            Value::Number(n) => insert(&mut table, key, n.to_string()),
            Value::Bool(_) | Value::Null => {}
        }
    }

    table
}

fn insert(table: &mut AbbreviationTable, key: Option<&str>, value: String) {
    if let Some(key) = key {
        table.entry(normalize_key(key)).or_insert(value);
    }
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the abbreviation for `value`, or `value` itself when the table
/// has none.
pub fn abbreviate(table: &AbbreviationTable, value: &str) -> String {
    table
        .get(&normalize_key(value))
        .cloned()
        .unwrap_or_else(|| value.trim().to_string())
}
