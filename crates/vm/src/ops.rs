//! Operator semantics for `unop_i` and `binop_i`.

use crate::error::RuntimeError;
use golite_common::{BinaryOp, UnaryOp, Value};
use std::cmp::Ordering;
use std::sync::Arc;

pub(crate) fn apply_unary(op: UnaryOp, operand: Value) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, other) => Err(RuntimeError::type_error(format!(
            "operator `{op}` cannot be applied to {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Str(a), Value::Str(b)) => {
                let joined = format!("{a}{b}");
                Ok(Value::Str(Arc::from(joined)))
            }
            _ => arith(op, lhs, rhs, i64::wrapping_add, |a, b| a + b),
        },
        BinaryOp::Sub => arith(op, lhs, rhs, i64::wrapping_sub, |a, b| a - b),
        BinaryOp::Mul => arith(op, lhs, rhs, i64::wrapping_mul, |a, b| a * b),
        BinaryOp::Div => match (&lhs, &rhs) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            _ => arith(op, lhs, rhs, i64::wrapping_div, |a, b| a / b),
        },
        BinaryOp::Rem => match (lhs, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(b))),
            (a, b) => Err(mismatch(op, &a, &b)),
        },
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let holds = match compare(op, &lhs, &rhs)? {
                Some(Ordering::Less) => matches!(op, BinaryOp::Lt | BinaryOp::Le),
                Some(Ordering::Equal) => matches!(op, BinaryOp::Le | BinaryOp::Ge),
                Some(Ordering::Greater) => matches!(op, BinaryOp::Gt | BinaryOp::Ge),
                None => false,
            };
            Ok(Value::Bool(holds))
        }
        BinaryOp::Eq => Ok(Value::Bool(equals(&lhs, &rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(&lhs, &rhs))),
    }
}

/// Numeric operators: int with int stays int, any float promotes.
fn arith(
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(a, b as f64))),
        (a, b) => Err(mismatch(op, &a, &b)),
    }
}

/// Ordering of two numbers or two strings. `None` when a NaN is involved.
fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        _ => match (as_float(lhs), as_float(rhs)) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(mismatch(op, lhs, rhs)),
        },
    }
}

fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        _ => lhs == rhs,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "operator `{op}` cannot be applied to {} and {}",
        lhs.type_name(),
        rhs.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinaryOp, a: Value, b: Value) -> Result<Value, RuntimeError> {
        apply_binary(op, a, b)
    }

    #[test]
    fn int_arithmetic_stays_int() {
        assert_eq!(bin(BinaryOp::Add, Value::Int(1), Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(bin(BinaryOp::Mul, Value::Int(4), Value::Int(5)), Ok(Value::Int(20)));
        assert_eq!(bin(BinaryOp::Div, Value::Int(7), Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(bin(BinaryOp::Rem, Value::Int(7), Value::Int(2)), Ok(Value::Int(1)));
    }

    #[test]
    fn mixed_arithmetic_promotes() {
        assert_eq!(
            bin(BinaryOp::Add, Value::Int(1), Value::Float(0.5)),
            Ok(Value::Float(1.5))
        );
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            bin(BinaryOp::Add, Value::str("go"), Value::str("lang")),
            Ok(Value::str("golang"))
        );
    }

    #[test]
    fn int_division_by_zero() {
        assert_eq!(
            bin(BinaryOp::Div, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(
            bin(BinaryOp::Rem, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(bin(BinaryOp::Lt, Value::Int(1), Value::Int(2)), Ok(Value::Bool(true)));
        assert_eq!(bin(BinaryOp::Ge, Value::Int(2), Value::Int(2)), Ok(Value::Bool(true)));
        assert_eq!(
            bin(BinaryOp::Gt, Value::str("b"), Value::str("a")),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            bin(BinaryOp::Le, Value::Float(2.5), Value::Int(2)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            bin(BinaryOp::Ge, Value::Float(f64::NAN), Value::Int(0)),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn equality_across_kinds() {
        assert_eq!(bin(BinaryOp::Eq, Value::Int(1), Value::Float(1.0)), Ok(Value::Bool(true)));
        assert_eq!(bin(BinaryOp::Ne, Value::Int(1), Value::str("1")), Ok(Value::Bool(true)));
        assert_eq!(
            bin(BinaryOp::Eq, Value::Undefined, Value::Undefined),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn type_errors_name_the_operands() {
        let err = bin(BinaryOp::Sub, Value::str("a"), Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type error: operator `-` cannot be applied to string and int"
        );
        assert!(bin(BinaryOp::Lt, Value::Bool(true), Value::Bool(false)).is_err());
    }

    #[test]
    fn unary_operators() {
        assert_eq!(apply_unary(UnaryOp::Neg, Value::Int(3)), Ok(Value::Int(-3)));
        assert_eq!(apply_unary(UnaryOp::Not, Value::Bool(false)), Ok(Value::Bool(true)));
        assert!(apply_unary(UnaryOp::Not, Value::Int(0)).is_err());
    }
}
