//! Rendering values back to source text.
//!
//! [`pr_str`] is the single entry point. With `readably` set, strings come
//! out quoted and escaped so that re-reading the output yields the same
//! value; without it, strings emit their raw contents (for user-facing
//! output like `println`). Keywords always print as `:name` regardless of
//! mode.

use crate::ast::{KEYWORD_MARKER, Value};

/// Render a value as text
pub fn pr_str(value: &Value, readably: bool) -> String {
    match value {
        Value::Nil => "nil".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format_string(s, readably),
        Value::Symbol(s) => s.clone(),
        Value::List(items) => format!("({})", print_seq(items, readably, " ")),
        Value::Vector(items) => format!("[{}]", print_seq(items, readably, " ")),
        Value::HashMap(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .flat_map(|(k, v)| [format_string(k, readably), pr_str(v, readably)])
                .collect();
            format!("{{{}}}", parts.join(" "))
        }
        Value::Error(msg) => format!("error: {msg}"),
        Value::BuiltinFunction { .. } => "#<builtin fn>".to_owned(),
        Value::Function { .. } => "#<function>".to_owned(),
    }
}

/// Render each value and join with the separator
pub(crate) fn print_seq(items: &[Value], readably: bool, separator: &str) -> String {
    items
        .iter()
        .map(|item| pr_str(item, readably))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Strings and keywords share a representation; the marker prefix decides
/// which rendering applies
fn format_string(s: &str, readably: bool) -> String {
    if let Some(name) = s.strip_prefix(KEYWORD_MARKER) {
        return format!(":{name}");
    }
    if !readably {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{keyword, sym, val};
    use std::collections::HashMap;

    /// Run print tests over (value, readable, non_readable) triples
    fn run_print_tests(test_cases: Vec<(Value, &str, &str)>) {
        for (i, (value, readable, plain)) in test_cases.iter().enumerate() {
            assert_eq!(
                &pr_str(value, true),
                readable,
                "Print test #{} readable mismatch",
                i + 1
            );
            assert_eq!(
                &pr_str(value, false),
                plain,
                "Print test #{} non-readable mismatch",
                i + 1
            );
        }
    }

    #[test]
    fn test_printer_comprehensive() {
        fn noop(_args: &[Value]) -> Value {
            Value::Nil
        }

        let test_cases = vec![
            // Scalars print as their source tokens in both modes
            (Value::Nil, "nil", "nil"),
            (val(true), "true", "true"),
            (val(false), "false", "false"),
            (val(42), "42", "42"),
            (val(-7), "-7", "-7"),
            (sym("foo"), "foo", "foo"),
            // Strings differ between the modes
            (val("hello"), "\"hello\"", "hello"),
            (val(""), "\"\"", ""),
            (val("a\nb"), "\"a\\nb\"", "a\nb"),
            (val("say \"hi\""), "\"say \\\"hi\\\"\"", "say \"hi\""),
            (val("back\\slash"), "\"back\\\\slash\"", "back\\slash"),
            // Keywords print as :name in both modes
            (keyword("kw"), ":kw", ":kw"),
            // Sequences
            (val([1, 2, 3]), "(1 2 3)", "(1 2 3)"),
            (Value::List(vec![]), "()", "()"),
            (Value::Vector(vec![val(1), val(2)]), "[1 2]", "[1 2]"),
            (
                Value::List(vec![sym("+"), val(1), val(vec![sym("*"), val(2), val(3)])]),
                "(+ 1 (* 2 3))",
                "(+ 1 (* 2 3))",
            ),
            // Strings nested in sequences follow the mode
            (
                Value::List(vec![val("a"), keyword("b")]),
                "(\"a\" :b)",
                "(a :b)",
            ),
            // Hash maps
            (
                Value::HashMap(HashMap::from([("k".to_owned(), val(1))])),
                "{\"k\" 1}",
                "{k 1}",
            ),
            (
                Value::HashMap(HashMap::new()),
                "{}",
                "{}",
            ),
            // Opaque function tokens
            (
                Value::BuiltinFunction {
                    id: "noop",
                    arity: crate::builtinops::Arity::AtLeast(0),
                    func: noop,
                },
                "#<builtin fn>",
                "#<builtin fn>",
            ),
            // Errors
            (
                Value::Error("x not found".to_owned()),
                "error: x not found",
                "error: x not found",
            ),
        ];

        run_print_tests(test_cases);
    }

    #[test]
    fn test_keyword_map_key_prints_as_keyword() {
        let map = Value::HashMap(HashMap::from([(
            format!("{KEYWORD_MARKER}k"),
            val("v"),
        )]));
        assert_eq!(pr_str(&map, true), "{:k \"v\"}");
        assert_eq!(pr_str(&map, false), "{:k v}");
    }

    #[test]
    fn test_print_seq_separators() {
        let items = [val(1), val("a"), keyword("b")];
        assert_eq!(print_seq(&items, true, " "), "1 \"a\" :b");
        assert_eq!(print_seq(&items, false, ""), "1a:b");
        assert_eq!(print_seq(&[], true, " "), "");
    }
}
