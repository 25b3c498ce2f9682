//! Golite common types.
//!
//! This crate provides the data model shared by the machine and its
//! hosts:
//!
//! - [`Command`]: source commands, the tree produced by the parser
//! - [`Program`]: the statement tree of one source file
//! - [`Value`]: runtime values (primitives, arrays, closures, built-ins)
//! - [`Env`]: lexical environments as chains of shared, mutable frames
//! - [`EnvError`] and [`DecodeError`]

pub mod command;
pub mod env;
pub mod error;
pub mod program;
pub mod value;

pub use command::{BinaryOp, Command, CommandRef, Literal, LogicalOp, Param, UnaryOp};
pub use env::Env;
pub use error::{DecodeError, EnvError};
pub use program::Program;
pub use value::{Array, Builtin, Closure, Value};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn arb_bindings() -> impl Strategy<Value = HashMap<String, i64>> {
        prop::collection::hash_map("[a-z][a-z0-9_]{0,6}", any::<i64>(), 0..12)
    }

    proptest! {
        /// Every name bound by `extend` is found by `lookup` with its value.
        #[test]
        fn extend_then_lookup_finds_every_name(bindings in arb_bindings()) {
            let (names, values): (Vec<String>, Vec<Value>) = bindings
                .iter()
                .map(|(k, v)| (k.clone(), Value::Int(*v)))
                .unzip();
            let env = Env::empty().extend(&names, values).unwrap();
            for (name, expected) in &bindings {
                prop_assert_eq!(env.lookup(name).unwrap(), Value::Int(*expected));
            }
        }

        /// The innermost binding wins and the outer one is untouched.
        #[test]
        fn shadowing_preserves_outer_binding(outer in any::<i64>(), inner in any::<i64>()) {
            let names = vec!["x".to_string()];
            let base = Env::empty().extend(&names, vec![Value::Int(outer)]).unwrap();
            let nested = base.extend(&names, vec![Value::Int(inner)]).unwrap();
            prop_assert_eq!(nested.lookup("x").unwrap(), Value::Int(inner));
            prop_assert_eq!(base.lookup("x").unwrap(), Value::Int(outer));
        }

        /// Names never bound anywhere are always unbound.
        #[test]
        fn names_outside_the_chain_are_unbound(bindings in arb_bindings()) {
            let (names, values): (Vec<String>, Vec<Value>) = bindings
                .iter()
                .map(|(k, v)| (k.clone(), Value::Int(*v)))
                .unzip();
            let env = Env::empty().extend(&names, values).unwrap();
            prop_assert!(matches!(env.lookup("UPPER"), Err(EnvError::Unbound { .. })), "UPPER should be unbound");
        }
    }
}
