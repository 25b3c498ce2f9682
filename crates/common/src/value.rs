//! Runtime value representation.
//!
//! Values live on the stash and in environment frames. Arrays and
//! closures are handles: cloning a value never copies the array it
//! points at, so every alias observes an in-place assignment.

use crate::command::{CommandRef, Literal};
use crate::env::Env;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// Result of statements and of reading a `nil` literal.
    Undefined,
    /// Placeholder for a name that is declared in scope but not yet
    /// initialized. Never observable by programs: lookup rejects it.
    Unassigned,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Arc<str>),
    Array(Array),
    Closure(Arc<Closure>),
    Builtin(Builtin),
}

/// A mutable, shared, ordered sequence of values.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

/// A function value: parameters, body, and the environment that was live
/// when the lambda was evaluated.
pub struct Closure {
    pub params: Vec<String>,
    pub body: CommandRef,
    pub env: Env,
}

/// A native function known to the machine by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtin {
    pub name: Arc<str>,
    pub arity: usize,
}

impl Array {
    pub fn new(elements: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(elements)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Overwrite the element at `index`. Returns `false` when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Copy of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// True if both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Array::new(elements))
    }

    /// Kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Unassigned => "unassigned",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Closure(_) => "closure",
            Value::Builtin(_) => "builtin",
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Value::Unassigned)
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(x) => Value::Float(*x),
            Literal::Str(s) => Value::str(s),
            Literal::Undefined => Value::Undefined,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// Arrays compare element-wise, closures by identity. Floats compare by
// value, so NaN != NaN. Array pairs already under comparison are assumed
// equal, which settles self-referential arrays.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut assumed: FxHashSet<(usize, usize)> = FxHashSet::default();
        let mut pending = vec![(self.clone(), other.clone())];
        while let Some(pair) = pending.pop() {
            match pair {
                (Value::Array(a), Value::Array(b)) => {
                    if a.ptr_eq(&b) || !assumed.insert((a.addr(), b.addr())) {
                        continue;
                    }
                    let (a, b) = (a.to_vec(), b.to_vec());
                    if a.len() != b.len() {
                        return false;
                    }
                    pending.extend(a.into_iter().zip(b));
                }
                (a, b) => {
                    if !scalar_eq(&a, &b) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn scalar_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Unassigned, Value::Unassigned) => true,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => false,
    }
}

enum Piece {
    Value(Value),
    Separator,
    Close(usize),
}

/// Write `value`, rendering arrays with an explicit stack. An array met
/// again inside itself prints as `[...]`.
fn render(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    scalar: fn(&mut fmt::Formatter<'_>, &Value) -> fmt::Result,
) -> fmt::Result {
    let mut open: FxHashSet<usize> = FxHashSet::default();
    let mut pieces = vec![Piece::Value(value.clone())];
    while let Some(piece) = pieces.pop() {
        match piece {
            Piece::Value(Value::Array(array)) => {
                let addr = array.addr();
                if !open.insert(addr) {
                    f.write_str("[...]")?;
                    continue;
                }
                f.write_str("[")?;
                pieces.push(Piece::Close(addr));
                for (i, element) in array.to_vec().into_iter().enumerate().rev() {
                    pieces.push(Piece::Value(element));
                    if i > 0 {
                        pieces.push(Piece::Separator);
                    }
                }
            }
            Piece::Value(other) => scalar(f, &other)?,
            Piece::Separator => f.write_str(", ")?,
            Piece::Close(addr) => {
                open.remove(&addr);
                f.write_str("]")?;
            }
        }
    }
    Ok(())
}

fn display_scalar(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Undefined => f.write_str("undefined"),
        Value::Unassigned => f.write_str("<unassigned>"),
        Value::Int(n) => write!(f, "{n}"),
        Value::Float(x) => write!(f, "{x}"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Str(s) => f.write_str(s),
        Value::Closure(_) => f.write_str("<closure>"),
        Value::Builtin(b) => write!(f, "<builtin: {}>", b.name),
        Value::Array(_) => f.write_str("[...]"),
    }
}

fn debug_scalar(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "Str({s:?})"),
        Value::Int(n) => write!(f, "Int({n})"),
        Value::Float(x) => write!(f, "Float({x})"),
        Value::Bool(b) => write!(f, "Bool({b})"),
        Value::Closure(c) => write!(f, "Closure({})", c.params.join(", ")),
        other => display_scalar(f, other),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self, display_scalar)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self, debug_scalar)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, &Value::Array(self.clone()), debug_scalar)
    }
}

// Dropping the last handle to a deeply nested array would otherwise
// recurse once per level.
impl Drop for Array {
    fn drop(&mut self) {
        let Some(lock) = Arc::get_mut(&mut self.0) else {
            return;
        };
        let mut orphans = std::mem::take(lock.get_mut());
        while let Some(value) = orphans.pop() {
            if let Value::Array(mut inner) = value {
                if let Some(lock) = Arc::get_mut(&mut inner.0) {
                    orphans.append(lock.get_mut());
                }
            }
        }
    }
}
