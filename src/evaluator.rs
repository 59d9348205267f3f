//! The evaluator: lexically scoped environments, special forms and
//! function application.
//!
//! [`eval`] walks the value tree recursively. Lists are inspected for a
//! special form at the head (`def!`, `let*`, `do`, `if`, `fn*`); any other
//! non-empty list is evaluated element-wise and applied. Evaluation
//! failures are not exceptions: they are [`Value::Error`] results that
//! every caller short-circuits on, so the control flow stays a straight
//! recursion.
//!
//! Environments form a parent-linked chain shared through reference
//! counting. A closure captures the environment it was defined in; calling
//! it creates a fresh child of that captured environment, never a
//! back-edge, so the chain stays acyclic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::Value;
use crate::builtinops::get_builtin_ops;
use crate::reader;

/// Forms evaluated into the fresh global environment before the first
/// user input. `not` is defined in the language itself.
const BOOTSTRAP: &[&str] = &["(def! not (fn* (a) (if a false true)))"];

/// One frame of the lexical chain: local bindings plus an optional parent
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<EnvRef>,
}

/// Shared handle to an environment frame
pub type EnvRef = Rc<Environment>;

impl Environment {
    /// Create an empty frame with an optional parent
    pub fn new(parent: Option<EnvRef>) -> EnvRef {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent,
        })
    }

    /// Create a frame binding `names` to `exprs` positionally. A `&` in
    /// the name list binds the following name to a list of the remaining
    /// expressions and stops.
    pub(crate) fn with_binds(parent: EnvRef, names: &[String], exprs: Vec<Value>) -> EnvRef {
        let env = Environment::new(Some(parent));
        let mut exprs = exprs.into_iter();
        for (i, name) in names.iter().enumerate() {
            if name == "&" {
                if let Some(rest_name) = names.get(i + 1) {
                    env.set(rest_name.clone(), Value::List(exprs.collect()));
                }
                break;
            }
            env.set(name.clone(), exprs.next().unwrap_or(Value::Nil));
        }
        env
    }

    /// Insert or overwrite a binding in this frame
    pub fn set(&self, key: String, value: Value) {
        self.bindings.borrow_mut().insert(key, value);
    }

    /// The innermost frame containing `key`, walking parents outward
    pub fn find(env: &EnvRef, key: &str) -> Option<EnvRef> {
        if env.bindings.borrow().contains_key(key) {
            Some(Rc::clone(env))
        } else {
            env.parent.as_ref().and_then(|parent| Environment::find(parent, key))
        }
    }

    /// A fresh owned copy of the value bound to `key`, if any frame in
    /// the chain binds it
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.bindings.borrow().get(key) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.get(key)),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Closures stored in a frame they capture would make a derived
        // Debug recurse forever; show only the local binding names.
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();
        write!(f, "Environment({names:?}, has_parent: {})", self.parent.is_some())
    }
}

/// Evaluate a form against an environment.
///
/// Always returns a value; failures come back as `Value::Error`.
pub fn eval(ast: &Value, env: &EnvRef) -> Value {
    match ast {
        // Error values pass through evaluation unchanged
        Value::Error(_) => ast.clone(),

        // Variable lookup
        Value::Symbol(name) => match env.get(name) {
            Some(value) => value,
            None => Value::Error(format!("{name} not found")),
        },

        // Special forms and application
        Value::List(elements) => eval_list(elements, env),

        // Vectors evaluate element-wise but are never applied
        Value::Vector(elements) => match eval_seq(elements, env) {
            Ok(items) => Value::Vector(items),
            Err(err) => err,
        },

        // Hash maps evaluate their values; keys pass through
        Value::HashMap(entries) => {
            let mut evaluated = HashMap::with_capacity(entries.len());
            for (key, expr) in entries {
                let value = eval(expr, env);
                if let Value::Error(_) = value {
                    return value;
                }
                evaluated.insert(key.clone(), value);
            }
            Value::HashMap(evaluated)
        }

        // Everything else is self-evaluating
        other => other.clone(),
    }
}

/// Evaluate each element in order, short-circuiting on the first error.
/// The partially built result is dropped with the early return.
fn eval_seq(elements: &[Value], env: &EnvRef) -> Result<Vec<Value>, Value> {
    let mut evaluated = Vec::with_capacity(elements.len());
    for element in elements {
        let value = eval(element, env);
        if let Value::Error(_) = value {
            return Err(value);
        }
        evaluated.push(value);
    }
    Ok(evaluated)
}

fn eval_list(elements: &[Value], env: &EnvRef) -> Value {
    // An empty list has no head to apply and evaluates to itself
    let Some(head) = elements.first() else {
        return Value::List(Vec::new());
    };

    if let Value::Symbol(name) = head {
        match name.as_str() {
            "def!" => return eval_def(&elements[1..], env),
            "let*" => return eval_let(&elements[1..], env),
            "do" => return eval_do(&elements[1..], env),
            "if" => return eval_if(&elements[1..], env),
            "fn*" => return eval_fn(&elements[1..], env),
            _ => {}
        }
    }

    match eval_seq(elements, env) {
        Ok(evaluated) => apply(evaluated),
        Err(err) => err,
    }
}

/// Apply the head of an evaluated list to its tail
fn apply(evaluated: Vec<Value>) -> Value {
    let mut evaluated = evaluated.into_iter();
    let Some(callee) = evaluated.next() else {
        return Value::List(Vec::new());
    };
    let args: Vec<Value> = evaluated.collect();
    debug!("apply {callee:?} to {} argument(s)", args.len());

    match callee {
        Value::BuiltinFunction { arity, func, .. } => {
            if !arity.accepts(args.len()) {
                return Value::Error("missing operands".to_owned());
            }
            func(&args)
        }
        Value::Function { params, body, env } => {
            if !closure_accepts(&params, args.len()) {
                return Value::Error("missing operands".to_owned());
            }
            let call_env = Environment::with_binds(env, &params, args);
            eval(&body, &call_env)
        }
        _ => Value::Error("trying to apply something else than a function".to_owned()),
    }
}

/// Exact match without `&`; at least the fixed prefix with it
fn closure_accepts(params: &[String], got: usize) -> bool {
    match params.iter().position(|p| p == "&") {
        Some(_) => got >= params.len() - 2,
        None => got == params.len(),
    }
}

/// `(def! name expr)`: bind in the current frame, return the value
fn eval_def(args: &[Value], env: &EnvRef) -> Value {
    let [name_form, expr] = args else {
        return Value::Error("missing operands".to_owned());
    };
    let Value::Symbol(name) = name_form else {
        return Value::Error("def! expects a symbol".to_owned());
    };
    let value = eval(expr, env);
    if let Value::Error(_) = value {
        return value;
    }
    env.set(name.clone(), value.clone());
    value
}

/// `(let* (n1 e1 n2 e2 ...) body)`: sequential bindings in a child frame.
/// Each expression sees the bindings before it.
fn eval_let(args: &[Value], env: &EnvRef) -> Value {
    let [bindings, body] = args else {
        return Value::Error("missing operands".to_owned());
    };
    let pairs = match bindings {
        Value::List(items) | Value::Vector(items) => items,
        _ => return Value::Error("let* bindings expect a list".to_owned()),
    };
    if pairs.len() % 2 != 0 {
        return Value::Error("let* bindings need an even number of arguments".to_owned());
    }

    let child = Environment::new(Some(Rc::clone(env)));
    for pair in pairs.chunks_exact(2) {
        let Value::Symbol(name) = &pair[0] else {
            return Value::Error("let* expects a symbol".to_owned());
        };
        let value = eval(&pair[1], &child);
        if let Value::Error(_) = value {
            return value;
        }
        child.set(name.clone(), value);
    }
    eval(body, &child)
}

/// `(do e1 e2 ... en)`: evaluate in order, return the last
fn eval_do(args: &[Value], env: &EnvRef) -> Value {
    if args.is_empty() {
        return Value::Error("missing operands".to_owned());
    }
    let mut result = Value::Nil;
    for expr in args {
        result = eval(expr, env);
        if let Value::Error(_) = result {
            return result;
        }
    }
    result
}

/// `(if cond then)` or `(if cond then else)`: nil and false take the else
/// branch, everything else the then branch
fn eval_if(args: &[Value], env: &EnvRef) -> Value {
    let (condition, then_branch, else_branch) = match args {
        [c, t] => (c, t, None),
        [c, t, e] => (c, t, Some(e)),
        _ => return Value::Error("missing operands".to_owned()),
    };
    let tested = eval(condition, env);
    if let Value::Error(_) = tested {
        return tested;
    }
    if tested.is_truthy() {
        eval(then_branch, env)
    } else {
        match else_branch {
            Some(alternative) => eval(alternative, env),
            None => Value::Nil,
        }
    }
}

/// `(fn* (params...) body)`: build a closure capturing the current
/// environment. At most one `&`, and only right before the rest name.
fn eval_fn(args: &[Value], env: &EnvRef) -> Value {
    let [params_form, body] = args else {
        return Value::Error("missing operands".to_owned());
    };
    let param_forms = match params_form {
        Value::List(items) | Value::Vector(items) => items,
        _ => return Value::Error("fn* expects a parameter list".to_owned()),
    };
    let mut params = Vec::with_capacity(param_forms.len());
    for form in param_forms {
        match form {
            Value::Symbol(name) => params.push(name.clone()),
            _ => return Value::Error("fn* parameters must be symbols".to_owned()),
        }
    }
    if let Some(pos) = params.iter().position(|p| p == "&") {
        if pos + 2 != params.len() || params[pos + 1] == "&" {
            return Value::Error("misplaced & in parameter list".to_owned());
        }
    }
    Value::Function {
        params,
        body: Box::new(body.clone()),
        env: Rc::clone(env),
    }
}

/// Create the global environment: every registry builtin under its name,
/// plus the bootstrap definitions.
pub fn create_global_env() -> EnvRef {
    let env = Environment::new(None);
    for op in get_builtin_ops() {
        env.set(
            op.id.to_owned(),
            Value::BuiltinFunction {
                id: op.id,
                arity: op.arity,
                func: op.func,
            },
        );
    }
    for snippet in BOOTSTRAP {
        let form = reader::read_str(snippet).expect("bootstrap form must parse");
        if let Value::Error(msg) = eval(&form, &env) {
            panic!("bootstrap form failed to evaluate: {msg}");
        }
    }
    env
}
