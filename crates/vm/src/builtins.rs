//! Built-in functions: name, arity, native implementation.
//!
//! Built-ins are bound in the outermost frame as [`Value::Builtin`]
//! values carrying only their name and arity; `app_i` resolves the name
//! back to the native function here.

use crate::error::RuntimeError;
use crate::machine::Shared;
use crate::waitgroup::Context;
use golite_common::{Builtin, Env, Value};
use std::sync::Arc;

type NativeFn = fn(&Shared, Context, &[Value]) -> Result<Value, RuntimeError>;

struct Native {
    name: &'static str,
    arity: usize,
    func: NativeFn,
}

const NATIVES: &[Native] = &[
    Native {
        name: "print",
        arity: 1,
        func: print,
    },
    Native {
        name: "array_length",
        arity: 1,
        func: array_length,
    },
    Native {
        name: "waitGroupAdd",
        arity: 1,
        func: wait_group_add,
    },
    Native {
        name: "waitGroupWait",
        arity: 0,
        func: wait_group_wait,
    },
];

/// The frame every program starts from.
pub(crate) fn builtin_env() -> Env {
    Env::root(NATIVES.iter().map(|native| {
        let value = Value::Builtin(Builtin {
            name: Arc::from(native.name),
            arity: native.arity,
        });
        (native.name.to_string(), value)
    }))
}

/// Names of all built-ins.
pub fn names() -> impl Iterator<Item = &'static str> {
    NATIVES.iter().map(|native| native.name)
}

/// Apply a built-in to its arguments.
pub(crate) fn invoke(
    shared: &Shared,
    context: Context,
    builtin: &Builtin,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let native = NATIVES
        .iter()
        .find(|native| native.name == &*builtin.name)
        .ok_or_else(|| RuntimeError::UnboundName {
            name: builtin.name.to_string(),
        })?;
    if args.len() != native.arity {
        return Err(RuntimeError::ArityMismatch {
            expected: native.arity,
            received: args.len(),
        });
    }
    (native.func)(shared, context, &args)
}

fn print(shared: &Shared, _: Context, args: &[Value]) -> Result<Value, RuntimeError> {
    shared.output.emit(&args[0].to_string());
    Ok(Value::Undefined)
}

fn array_length(_: &Shared, _: Context, args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Array(array) => Ok(Value::Int(array.len() as i64)),
        other => Err(RuntimeError::type_error(format!(
            "array_length expects an array, found {}",
            other.type_name()
        ))),
    }
}

fn wait_group_add(shared: &Shared, _: Context, args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Int(delta) => {
            let counter = shared.wait_group.add(*delta)?;
            tracing::debug!(delta, counter, "wait-group add");
            Ok(Value::Undefined)
        }
        other => Err(RuntimeError::type_error(format!(
            "waitGroupAdd expects an int, found {}",
            other.type_name()
        ))),
    }
}

fn wait_group_wait(shared: &Shared, context: Context, _: &[Value]) -> Result<Value, RuntimeError> {
    tracing::debug!(counter = shared.wait_group.counter(), "wait-group wait");
    shared.wait_group.wait_as(context)?;
    tracing::debug!("wait-group released");
    Ok(Value::Undefined)
}
