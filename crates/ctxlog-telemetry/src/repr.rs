//! Opaque string rendering of invocation arguments and results.
//!
//! The output is meant for humans reading log lines. It is not JSON and
//! downstream consumers must not try to parse it back.

use serde_json::{Map, Value};
use std::fmt::Write;

/// Render positional arguments as a tuple: `()`, `(1,)`, `(1, 2)`.
pub(crate) fn render_args(args: &[Value]) -> String {
    let mut out = String::from("(");
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_value(&mut out, arg);
    }
    if args.len() == 1 {
        out.push(',');
    }
    out.push(')');
    out
}

/// Render keyword arguments as a map: `{}`, `{'key': 1}`.
pub(crate) fn render_kwargs(kwargs: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_map(&mut out, kwargs);
    out
}

/// Render a call result in its display form.
///
/// Strings are rendered bare; every other value is rendered the same way
/// it would appear inside an argument list.
pub(crate) fn render_result(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => {
            let mut out = String::new();
            write_value(&mut out, other);
            out
        },
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        },
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        },
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        },
        Value::Object(map) => write_map(out, map),
    }
}

fn write_map(out: &mut String, map: &Map<String, Value>) {
    out.push('{');
    for (idx, (key, value)) in map.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_quoted(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_args_tuple_shapes() {
        assert_eq!(render_args(&[]), "()");
        assert_eq!(render_args(&[json!(1)]), "(1,)");
        assert_eq!(render_args(&[json!(1), json!(2)]), "(1, 2)");
    }

    #[test]
    fn test_render_args_nested_values() {
        let args = [json!("it's"), json!([1, null]), json!({"b": true, "a": 1.5})];
        assert_eq!(
            render_args(&args),
            r"('it\'s', [1, null], {'a': 1.5, 'b': true})"
        );
    }

    #[test]
    fn test_render_kwargs() {
        assert_eq!(render_kwargs(&Map::new()), "{}");

        let mut kwargs = Map::new();
        kwargs.insert("user".to_string(), json!("ada"));
        kwargs.insert("limit".to_string(), json!(10));
        assert_eq!(render_kwargs(&kwargs), "{'limit': 10, 'user': 'ada'}");
    }

    #[test]
    fn test_render_result_strings_are_bare() {
        assert_eq!(render_result(&json!("ok")), "ok");
        assert_eq!(render_result(&json!(42)), "42");
        assert_eq!(render_result(&json!({"id": "x"})), "{'id': 'x'}");
    }

    #[test]
    fn test_non_ascii_is_kept() {
        assert_eq!(render_args(&[json!("größe")]), "('größe',)");
    }
}
