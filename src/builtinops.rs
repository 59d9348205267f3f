//! Built-in procedure registry.
//!
//! Every builtin is a plain function `fn(&[Value]) -> Value` registered in
//! one table with its name and arity. The evaluator seeds the global
//! environment from this table and checks the arity before invoking the
//! function, so implementations can rely on the argument count.
//!
//! Failures follow the interpreter-wide convention: builtins return
//! `Value::Error` (e.g. `expected integer operand`), never panic, and
//! never raise.
//!
//! ## Adding a new operation
//!
//! 1. Implement the function with the signature `fn(args: &[Value]) -> Value`
//! 2. Add a `BuiltinOp` entry to `BUILTIN_OPS` with its name and arity
//! 3. Add test coverage for the regular and error paths

use crate::ast::{BuiltinFn, NumberType, Value};
use crate::printer::print_seq;

/// Expected number of arguments for a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments
    Exact(usize),
    /// This many arguments or more
    AtLeast(usize),
}

impl Arity {
    /// Check a call's argument count against this arity
    pub(crate) fn accepts(self, got: usize) -> bool {
        match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
        }
    }
}

/// Definition of a built-in operation
pub struct BuiltinOp {
    /// The name this operation is bound to in the global environment
    pub id: &'static str,
    /// Expected number of arguments, validated by the evaluator
    pub arity: Arity,
    /// The implementation
    pub func: BuiltinFn,
}

//
// Builtin Function Implementations
//

// Macro to generate the checked two-integer arithmetic functions
macro_rules! checked_arithmetic {
    ($name:ident, $method:ident, $what:literal) => {
        fn $name(args: &[Value]) -> Value {
            match args {
                [Value::Number(a), Value::Number(b)] => match a.$method(*b) {
                    Some(n) => Value::Number(n),
                    None => Value::Error(concat!("integer overflow in ", $what).to_owned()),
                },
                _ => Value::Error("expected integer operand".to_owned()),
            }
        }
    };
}

checked_arithmetic!(builtin_add, checked_add, "addition");
checked_arithmetic!(builtin_sub, checked_sub, "subtraction");
checked_arithmetic!(builtin_mul, checked_mul, "multiplication");

fn builtin_div(args: &[Value]) -> Value {
    match args {
        [Value::Number(a), Value::Number(b)] => {
            if *b == 0 {
                return Value::Error("division by zero".to_owned());
            }
            match a.checked_div(*b) {
                Some(n) => Value::Number(n),
                None => Value::Error("integer overflow in division".to_owned()),
            }
        }
        _ => Value::Error("expected integer operand".to_owned()),
    }
}

// Macro to generate the two-integer comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(args: &[Value]) -> Value {
            match args {
                [Value::Number(a), Value::Number(b)] => Value::Bool(a $op b),
                _ => Value::Error("expected integer operand".to_owned()),
            }
        }
    };
}

numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_ge, >=);

fn builtin_list(args: &[Value]) -> Value {
    Value::List(args.to_vec())
}

fn builtin_is_list(args: &[Value]) -> Value {
    Value::Bool(matches!(args, [Value::List(_)]))
}

fn builtin_is_empty(args: &[Value]) -> Value {
    match args {
        [Value::List(items) | Value::Vector(items)] => Value::Bool(items.is_empty()),
        _ => Value::Error("empty? expects a list".to_owned()),
    }
}

fn builtin_count(args: &[Value]) -> Value {
    match args {
        [Value::List(items) | Value::Vector(items)] => Value::Number(items.len() as NumberType),
        [Value::Nil] => Value::Number(0),
        _ => Value::Error("count expects a list".to_owned()),
    }
}

/// Structural equality across all value kinds, lists and vectors included
fn builtin_equal(args: &[Value]) -> Value {
    match args {
        [a, b] => Value::Bool(a == b),
        _ => Value::Error("missing operands".to_owned()),
    }
}

fn builtin_pr_str(args: &[Value]) -> Value {
    Value::String(print_seq(args, true, " "))
}

fn builtin_str(args: &[Value]) -> Value {
    Value::String(print_seq(args, false, ""))
}

fn builtin_prn(args: &[Value]) -> Value {
    println!("{}", print_seq(args, true, " "));
    Value::Nil
}

fn builtin_println(args: &[Value]) -> Value {
    println!("{}", print_seq(args, false, " "));
    Value::Nil
}

/// Registry of all built-in operations, in the order they seed the global
/// environment
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Arithmetic operations
    BuiltinOp {
        id: "+",
        arity: Arity::Exact(2),
        func: builtin_add,
    },
    BuiltinOp {
        id: "-",
        arity: Arity::Exact(2),
        func: builtin_sub,
    },
    BuiltinOp {
        id: "*",
        arity: Arity::Exact(2),
        func: builtin_mul,
    },
    BuiltinOp {
        id: "/",
        arity: Arity::Exact(2),
        func: builtin_div,
    },
    // Comparison operations
    BuiltinOp {
        id: "<",
        arity: Arity::Exact(2),
        func: builtin_lt,
    },
    BuiltinOp {
        id: "<=",
        arity: Arity::Exact(2),
        func: builtin_le,
    },
    BuiltinOp {
        id: ">",
        arity: Arity::Exact(2),
        func: builtin_gt,
    },
    BuiltinOp {
        id: ">=",
        arity: Arity::Exact(2),
        func: builtin_ge,
    },
    // List operations
    BuiltinOp {
        id: "list",
        arity: Arity::AtLeast(0),
        func: builtin_list,
    },
    BuiltinOp {
        id: "list?",
        arity: Arity::Exact(1),
        func: builtin_is_list,
    },
    BuiltinOp {
        id: "empty?",
        arity: Arity::Exact(1),
        func: builtin_is_empty,
    },
    BuiltinOp {
        id: "count",
        arity: Arity::Exact(1),
        func: builtin_count,
    },
    // Equality
    BuiltinOp {
        id: "=",
        arity: Arity::Exact(2),
        func: builtin_equal,
    },
    // Printing operations
    BuiltinOp {
        id: "pr-str",
        arity: Arity::AtLeast(0),
        func: builtin_pr_str,
    },
    BuiltinOp {
        id: "str",
        arity: Arity::AtLeast(0),
        func: builtin_str,
    },
    BuiltinOp {
        id: "prn",
        arity: Arity::AtLeast(0),
        func: builtin_prn,
    },
    BuiltinOp {
        id: "println",
        arity: Arity::AtLeast(0),
        func: builtin_println,
    },
];

/// All builtin operations (for environment seeding by the evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}
