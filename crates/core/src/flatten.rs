//! Response-body flattening.
//!
//! Feeds arrive as a bare object, a list of objects, lists of lists, or an
//! object wrapping the list. [`unwrap_envelope`] strips the wrapper and
//! [`flatten`] reduces whatever remains to a flat list of candidate records.
//! Neither function fails: unsupported shapes degrade to fewer records plus
//! a diagnostic.

use serde_json::Value;

use crate::model::{json_type_name, RawRecord};
use crate::reconcile::is_known_key;

/// Input shapes the flattener distinguishes.
enum Shape<'a> {
    Record(&'a RawRecord),
    List(&'a [Value]),
    Other(&'a Value),
}

fn shape_of(value: &Value) -> Shape<'_> {
    match value {
        Value::Object(map) => Shape::Record(map),
        Value::Array(items) => Shape::List(items),
        other => Shape::Other(other),
    }
}

/// An input element that was not a record and got dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    /// Position inside the body, e.g. `$[2]` or `$[1][0]`.
    pub path: String,
    /// JSON type name of the dropped element.
    pub kind: &'static str,
}

#[derive(Debug, Default)]
pub struct Flattened {
    pub records: Vec<RawRecord>,
    pub skipped: Vec<Skipped>,
}

/// Flatten a body into records, logging a warning per dropped element.
pub fn flatten(input: &Value) -> Vec<RawRecord> {
    let flattened = flatten_with_diagnostics(input);
    for skip in &flattened.skipped {
        log::warn!("skipping non-record {} at {}", skip.kind, skip.path);
    }
    flattened.records
}

/// Flatten a body and return the dropped elements alongside the records.
pub fn flatten_with_diagnostics(input: &Value) -> Flattened {
    let mut out = Flattened::default();
    match shape_of(input) {
        Shape::Record(map) => out.records.push(map.clone()),
        Shape::List(items) => collect_list(items, "$", &mut out),
        Shape::Other(value) => out.skipped.push(Skipped {
            path: "$".to_string(),
            kind: json_type_name(value),
        }),
    }
    out
}

fn collect_list(items: &[Value], path: &str, out: &mut Flattened) {
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        match shape_of(item) {
            Shape::Record(map) => out.records.push(map.clone()),
            Shape::List(nested) => collect_list(nested, &item_path, out),
            Shape::Other(value) => out.skipped.push(Skipped {
                path: item_path,
                kind: json_type_name(value),
            }),
        }
    }
}

/// Strip wrapper objects around the record list.
///
/// An object none of whose keys is a known vehicle field is treated as an
/// envelope: its first list value holding vehicle records is returned, or,
/// when it has a single object-valued entry (an XML root element), that
/// entry is descended into. Anything else is returned unchanged, so a record
/// whose keys merely miss the alias tables stays one record.
pub fn unwrap_envelope(body: &Value) -> &Value {
    let mut current = body;
    loop {
        let Value::Object(map) = current else {
            return current;
        };
        if has_known_key(map) {
            return current;
        }

        let list = map.values().find(|v| match v {
            Value::Array(items) => holds_vehicle(items),
            _ => false,
        });
        if let Some(list) = list {
            return list;
        }

        match map.values().next() {
            Some(inner @ Value::Object(_)) if map.len() == 1 => current = inner,
            _ => return current,
        }
    }
}

fn has_known_key(map: &RawRecord) -> bool {
    map.keys().any(|k| is_known_key(k))
}

/// True when some mapping in `items`, at any list depth, has a vehicle field.
fn holds_vehicle(items: &[Value]) -> bool {
    items.iter().any(|item| match item {
        Value::Object(map) => has_known_key(map),
        Value::Array(nested) => holds_vehicle(nested),
        _ => false,
    })
}
