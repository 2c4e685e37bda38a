//! Tagged-JSON emission tests
//!
//! Tag mapping for every value shape, spelling preservation for
//! numbers, and the determinism that makes emit-parse-emit stable.

use serde_json::json;
use tomlet::parse_str;

#[test]
fn test_scalar_tag_mapping() {
    let input = "\
s = \"text\"\n\
i = 42\n\
f = 3.14\n\
b = true\n\
odt = 1979-05-27T07:32:00Z\n\
ldt = 1979-05-27T07:32:00\n\
ld = 1979-05-27\n\
lt = 07:32:00\n";
    let doc = parse_str(input).unwrap();
    assert_eq!(
        doc.to_tagged_json(),
        json!({
            "s": {"type": "string", "value": "text"},
            "i": {"type": "integer", "value": "42"},
            "f": {"type": "float", "value": "3.14"},
            "b": {"type": "bool", "value": "true"},
            "odt": {"type": "datetime", "value": "1979-05-27T07:32:00Z"},
            "ldt": {"type": "datetime-local", "value": "1979-05-27T07:32:00"},
            "ld": {"type": "date-local", "value": "1979-05-27"},
            "lt": {"type": "time-local", "value": "07:32:00"},
        })
    );
}

#[test]
fn test_tables_become_objects() {
    let doc = parse_str("[a.b]\nk = 1\n[c]\nx = 2").unwrap();
    assert_eq!(
        doc.to_tagged_json(),
        json!({
            "a": {"b": {"k": {"type": "integer", "value": "1"}}},
            "c": {"x": {"type": "integer", "value": "2"}},
        })
    );
}

#[test]
fn test_inline_tables_become_objects() {
    let doc = parse_str("point = { x = 1, y = 2 }").unwrap();
    assert_eq!(
        doc.to_tagged_json(),
        json!({
            "point": {
                "x": {"type": "integer", "value": "1"},
                "y": {"type": "integer", "value": "2"},
            }
        })
    );
}

#[test]
fn test_arrays_and_array_tables() {
    let doc = parse_str("ints = [1, 2]\n[[t]]\na = 1\n[[t]]\na = 2").unwrap();
    assert_eq!(
        doc.to_tagged_json(),
        json!({
            "ints": [
                {"type": "integer", "value": "1"},
                {"type": "integer", "value": "2"}
            ],
            "t": [
                {"a": {"type": "integer", "value": "1"}},
                {"a": {"type": "integer", "value": "2"}}
            ]
        })
    );
}

#[test]
fn test_float_spelling_preserved() {
    let doc = parse_str("a = 1.10\nb = 5e+22\nc = 6.626e-34\nd = 1e2").unwrap();
    let emitted = doc.to_tagged_json();
    assert_eq!(emitted["a"]["value"], "1.10");
    assert_eq!(emitted["b"]["value"], "5e22");
    assert_eq!(emitted["c"]["value"], "6.626e-34");
    assert_eq!(emitted["d"]["value"], "1e2");
}

#[test]
fn test_special_floats_as_literal_strings() {
    let doc = parse_str("a = inf\nb = -inf\nc = nan\nd = -nan").unwrap();
    let emitted = doc.to_tagged_json();
    assert_eq!(emitted["a"]["value"], "inf");
    assert_eq!(emitted["b"]["value"], "-inf");
    assert_eq!(emitted["c"]["value"], "nan");
    assert_eq!(emitted["d"]["value"], "nan");
}

#[test]
fn test_offset_spellings_distinct() {
    let doc = parse_str("z = 1979-05-27T07:32:00Z\nnum = 1979-05-27T07:32:00+00:00").unwrap();
    let emitted = doc.to_tagged_json();
    assert_eq!(emitted["z"]["value"], "1979-05-27T07:32:00Z");
    assert_eq!(emitted["num"]["value"], "1979-05-27T07:32:00+00:00");
}

#[test]
fn test_fraction_emission() {
    let doc = parse_str("a = 07:32:00.5\nb = 07:32:00.999999").unwrap();
    let emitted = doc.to_tagged_json();
    assert_eq!(emitted["a"]["value"], "07:32:00.500");
    assert_eq!(emitted["b"]["value"], "07:32:00.999999");
}

#[test]
fn test_emission_is_deterministic() {
    let input = r#"
title = "repeatable"
[server]
host = "localhost"
ports = [8000, 8001]
[[jobs]]
name = "first"
[[jobs]]
name = "second"
"#;
    let first = parse_str(input).unwrap();
    let second = parse_str(input).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.to_tagged_json_string(),
        second.to_tagged_json_string()
    );
}

#[test]
fn test_unicode_strings_pass_through() {
    let doc = parse_str("s = \"caf\u{e9} \\u00E9\"").unwrap();
    assert_eq!(doc.to_tagged_json()["s"]["value"], "café é");
}
