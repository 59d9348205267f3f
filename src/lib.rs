//! malrs - a small interpreter for the mal teaching Lisp
//!
//! This crate implements the core pipeline of a mal interpreter: a reader
//! that turns source text into a value tree, a lexically scoped environment
//! with chained parents, an evaluator that dispatches the special forms and
//! applies builtin and user-defined procedures, and a printer that renders
//! values back to source text.
//!
//! ```text
//! user> (def! sq (fn* (n) (* n n)))
//! #<function>
//! user> (sq 5)
//! 25
//! user> (let* (a 6 b (* a 2)) (+ a b))
//! 18
//! ```
//!
//! ## Error model
//!
//! Failures come in two tiers. The reader raises [`ReadError`] out of
//! [`reader::read_str`]; the REPL maps each kind to a fixed human string and
//! continues. Evaluation failures are *values*: the evaluator returns
//! [`ast::Value::Error`], which flows through the recursion like any other
//! value and prints as `error: MSG`. There is no exception mechanism.
//!
//! ## Modules
//!
//! - `reader`: tokenizing and parsing source text into values
//! - `printer`: rendering values as text, readably or not
//! - `evaluator`: environments, special forms and application
//! - `builtinops`: the builtin procedure registry
//! - `ast`: the value representation shared by all of the above

use std::fmt;

/// The distinct ways the reader can reject its input.
///
/// These are raised as `Err` out of the reader, unlike evaluation errors
/// which travel as `Value::Error`. The `Display` rendering is the exact
/// string the REPL prints after `error: `.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// A string literal ended at end of input without its closing quote
    UnfinishedQuote,
    /// A collection was never closed, or a stray closing delimiter appeared
    UnbalancedParenthesis,
    /// A form was required but the token stream was exhausted
    /// (e.g. a reader macro with no payload)
    Underflow,
    /// A hash-map key position held something other than a string or keyword
    KeyIsNotString,
    /// A hash map literal contained an odd number of forms
    UnevenHashMap,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ReadError::UnfinishedQuote => "unbalanced quote",
            ReadError::UnbalancedParenthesis => "unbalanced parenthesis",
            ReadError::Underflow => "unexpected end of input",
            ReadError::KeyIsNotString => "hash map keys must be strings or keywords",
            ReadError::UnevenHashMap => "hash map needs an even number of forms",
        };
        f.write_str(message)
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod printer;
pub mod reader;
