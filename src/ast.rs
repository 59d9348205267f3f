//! This module defines the core value type of the interpreter. The main
//! enum, [`Value`], covers every mal data type: nil, booleans, integers,
//! strings, keywords, symbols, lists, vectors, hash maps, error values,
//! builtin procedures and user-defined closures. Ergonomic helper functions
//! such as [`val`], [`sym`] and [`keyword`] are provided for convenient
//! construction in code and tests, together with conversion traits for
//! common Rust types. Equality is structural and matches mal semantics:
//! lists and vectors cross-compare element-wise, hash maps compare by keys
//! and values, and functions never equal anything.

use std::collections::HashMap;

use crate::builtinops::Arity;
use crate::evaluator::EnvRef;
use crate::printer;

/// Type alias for number values in the interpreter
pub(crate) type NumberType = i64;

/// Marker prefix distinguishing keywords from ordinary strings.
///
/// A keyword `:name` is stored as this marker followed by `name`, so that
/// hash-map keys can share the plain string representation. The marker is
/// a non-printable codepoint that the reader never produces inside a
/// user-written string literal.
pub(crate) const KEYWORD_MARKER: char = '\u{29E}';

/// Signature shared by every builtin procedure: evaluated arguments in,
/// one value out. Failures are reported as `Value::Error`, never panics.
pub type BuiltinFn = fn(&[Value]) -> Value;

/// Core value type of the interpreter.
///
/// Every variant owns its payload; the only shared state is the
/// environment chain captured by `Function`, which is reference-counted.
///
/// To build values in code or tests, use the helper functions:
/// - `val(42)`, `val("text")`, `val(true)` for scalars
/// - `sym("name")` for symbols, `keyword("name")` for keywords
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// The nil literal
    Nil,
    /// Boolean values
    Bool(bool),
    /// Numbers (64-bit signed integers only)
    Number(NumberType),
    /// String literals; keywords are stored here with a marker prefix
    String(String),
    /// Symbols (identifiers resolved against the environment)
    Symbol(String),
    /// Lists: the application form
    List(Vec<Value>),
    /// Vectors: evaluated element-wise but never applied
    Vector(Vec<Value>),
    /// Hash maps keyed by strings or keywords
    HashMap(HashMap<String, Value>),
    /// An evaluation failure, flowing through the interpreter as a value
    Error(String),
    /// Builtin procedures; arity travels with the value so dynamically
    /// passed builtins are still checked at application time
    BuiltinFunction {
        id: &'static str,
        arity: Arity,
        func: BuiltinFn,
    },
    /// User-defined procedures (params, body, captured env)
    Function {
        params: Vec<String>,
        body: Box<Value>,
        env: EnvRef,
    },
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String(\"{s}\")"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(items) => debug_seq(f, "List", items),
            Value::Vector(items) => debug_seq(f, "Vector", items),
            Value::HashMap(entries) => {
                write!(f, "HashMap(")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{k}\": {v:?}")?;
                }
                write!(f, ")")
            }
            Value::Error(msg) => write!(f, "Error({msg})"),
            Value::BuiltinFunction { id, .. } => write!(f, "BuiltinFunction({id})"),
            Value::Function { params, body, .. } => {
                // The captured environment is omitted: closures stored in an
                // environment they capture would recurse forever.
                write!(f, "Function(params={params:?}, body={body:?})")
            }
        }
    }
}

fn debug_seq(f: &mut std::fmt::Formatter<'_>, name: &str, items: &[Value]) -> std::fmt::Result {
    write!(f, "{name}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item:?}")?;
    }
    write!(f, ")")
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(n as i64)
            }
        }
    };
}

// Generate From implementations for all integer types
impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(|x| x.into()).collect())
    }
}

/// Helper function for creating symbols - works great in mixed lists!
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from any convertible type
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Build a keyword value: the marker prefix followed by the name
pub(crate) fn keyword(name: &str) -> Value {
    Value::String(format!("{KEYWORD_MARKER}{name}"))
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&printer::pr_str(self, true))
    }
}

impl Value {
    /// Everything is truthy except nil and false
    pub(crate) fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            // Keywords are marker-prefixed strings, so a keyword never
            // equals the ordinary string spelled the same way
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            // Lists and vectors cross-compare element-wise
            (Value::List(a) | Value::Vector(a), Value::List(b) | Value::Vector(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::HashMap(a), Value::HashMap(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w))
            }
            // Builtins and closures never equal anything
            _ => false,
        }
    }
}
