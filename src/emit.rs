//! Type-tagged JSON emission
//!
//! The conformance serialization: every scalar becomes
//! `{"type": <tag>, "value": <string>}`, arrays become JSON arrays,
//! tables and inline tables become JSON objects in insertion order, and
//! arrays of tables become JSON arrays of objects.
//!
//! Numbers are re-rendered from the spelling facts the parser kept:
//! integers in decimal, floats with their source precision and in
//! scientific notation when the source used it. The special floats
//! become the literal strings `inf`, `-inf` and `nan`.

use serde_json::{json, Map};

use crate::table::{Node, Table};
use crate::value::Value;

/// Serialize a document tree to the tagged-JSON form.
pub fn table_to_json(table: &Table) -> serde_json::Value {
    let mut map = Map::with_capacity(table.len());
    for (key, node) in table.iter() {
        map.insert(key.to_string(), node_to_json(node));
    }
    serde_json::Value::Object(map)
}

fn node_to_json(node: &Node) -> serde_json::Value {
    match node {
        Node::KeyBranch(table) | Node::TableBranch(table) | Node::TableLeaf(table) => {
            table_to_json(table)
        }
        Node::KeyLeaf(value) => value_to_json(value),
        Node::ArrayTable(elements) => {
            serde_json::Value::Array(elements.iter().map(table_to_json).collect())
        }
    }
}

/// Serialize one value to the tagged-JSON form.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(n) => tagged("integer", n.to_string()),
        Value::Float {
            value,
            precision,
            scientific,
        } => tagged("float", render_float(*value, *precision, *scientific)),
        Value::Boolean(b) => tagged("bool", b.to_string()),
        Value::String(s) => tagged("string", s.clone()),
        Value::OffsetDateTime { date, time, offset } => {
            tagged("datetime", format!("{}T{}{}", date, time, offset))
        }
        Value::LocalDateTime { date, time } => {
            tagged("datetime-local", format!("{}T{}", date, time))
        }
        Value::LocalDate(date) => tagged("date-local", date.to_string()),
        Value::LocalTime(time) => tagged("time-local", time.to_string()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Table(table) => table_to_json(table),
    }
}

fn tagged(tag: &str, value: String) -> serde_json::Value {
    json!({ "type": tag, "value": value })
}

fn render_float(value: f64, precision: usize, scientific: bool) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if scientific {
        format!("{:.*e}", precision, value)
    } else {
        // A non-scientific float always has at least one fraction digit.
        format!("{:.*}", precision.max(1), value)
    }
}
