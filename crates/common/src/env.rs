//! Lexical environments: a chain of frames mapping names to values.
//!
//! An [`Env`] is a cheap, reference-counted handle to one frame plus its
//! parent. Extending never copies: the new frame points at the old chain.
//! Frames are mutable in place, and every environment (and closure) that
//! shares a frame observes assignments made through any of them.

use crate::error::EnvError;
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

type Frame = RwLock<FxHashMap<String, Value>>;

struct Scope {
    frame: Frame,
    parent: Option<Env>,
}

/// Handle to an environment chain.
#[derive(Clone)]
pub struct Env(Arc<Scope>);

impl Env {
    /// An environment with one empty frame and no parent.
    pub fn empty() -> Self {
        Self::root(std::iter::empty())
    }

    /// An outermost environment holding the given bindings.
    pub fn root(bindings: impl IntoIterator<Item = (String, Value)>) -> Self {
        Env(Arc::new(Scope {
            frame: RwLock::new(bindings.into_iter().collect()),
            parent: None,
        }))
    }

    /// Find the value bound to `name`, walking frames outward.
    pub fn lookup(&self, name: &str) -> Result<Value, EnvError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.0.frame.read().get(name) {
                if value.is_unassigned() {
                    return Err(EnvError::Unassigned { name: name.into() });
                }
                return Ok(value.clone());
            }
            scope = env.0.parent.as_ref();
        }
        Err(EnvError::Unbound { name: name.into() })
    }

    /// Overwrite the binding of `name` in the innermost frame that has one.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EnvError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(slot) = env.0.frame.write().get_mut(name) {
                *slot = value;
                return Ok(());
            }
            scope = env.0.parent.as_ref();
        }
        Err(EnvError::Unbound { name: name.into() })
    }

    /// A new environment whose first frame binds `names` to `values`
    /// and whose parent is `self`.
    pub fn extend(&self, names: &[String], values: Vec<Value>) -> Result<Env, EnvError> {
        if names.len() != values.len() {
            return Err(EnvError::Arity {
                expected: names.len(),
                received: values.len(),
            });
        }
        Ok(Env(Arc::new(Scope {
            frame: RwLock::new(names.iter().cloned().zip(values).collect()),
            parent: Some(self.clone()),
        })))
    }

    /// Number of frames in the chain.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.0.parent.as_ref();
        while let Some(env) = scope {
            depth += 1;
            scope = env.0.parent.as_ref();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Env) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// Frames may hold closures that point back at them; print the shape only.
impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.0.frame.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Env")
            .field("names", &names)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn extend_then_lookup() {
        let env = Env::empty()
            .extend(&names(&["a", "b"]), vec![Value::Int(1), Value::Int(2)])
            .unwrap();
        assert_eq!(env.lookup("b"), Ok(Value::Int(2)));
        assert_eq!(env.lookup("a"), Ok(Value::Int(1)));
    }

    #[test]
    fn lookup_missing_is_unbound() {
        let env = Env::empty();
        assert_eq!(
            env.lookup("nope"),
            Err(EnvError::Unbound {
                name: "nope".into()
            })
        );
    }

    #[test]
    fn lookup_unassigned_is_distinct() {
        let env = Env::empty()
            .extend(&names(&["x"]), vec![Value::Unassigned])
            .unwrap();
        assert_eq!(
            env.lookup("x"),
            Err(EnvError::Unassigned { name: "x".into() })
        );
    }

    #[test]
    fn inner_frame_shadows_outer() {
        let outer = Env::root([("x".to_string(), Value::Int(1))]);
        let inner = outer.extend(&names(&["x"]), vec![Value::Int(2)]).unwrap();
        assert_eq!(inner.lookup("x"), Ok(Value::Int(2)));
        assert_eq!(outer.lookup("x"), Ok(Value::Int(1)));
    }

    #[test]
    fn assign_mutates_innermost_binding_frame() {
        let outer = Env::root([("x".to_string(), Value::Int(1))]);
        let inner = outer.extend(&names(&["y"]), vec![Value::Int(0)]).unwrap();
        inner.assign("x", Value::Int(5)).unwrap();
        assert_eq!(outer.lookup("x"), Ok(Value::Int(5)));
        assert_eq!(
            inner.assign("z", Value::Int(0)),
            Err(EnvError::Unbound { name: "z".into() })
        );
    }

    #[test]
    fn assignment_visible_through_shared_frame() {
        let shared = Env::empty()
            .extend(&names(&["n"]), vec![Value::Int(0)])
            .unwrap();
        let a = shared.extend(&[], vec![]).unwrap();
        let b = shared.extend(&[], vec![]).unwrap();
        a.assign("n", Value::Int(42)).unwrap();
        assert_eq!(b.lookup("n"), Ok(Value::Int(42)));
    }

    #[test]
    fn extend_arity_mismatch() {
        let err = Env::empty()
            .extend(&names(&["a", "b"]), vec![Value::Int(1)])
            .unwrap_err();
        assert_eq!(
            err,
            EnvError::Arity {
                expected: 2,
                received: 1
            }
        );
    }

    #[test]
    fn depth_counts_frames() {
        let env = Env::empty();
        assert_eq!(env.depth(), 1);
        let env = env.extend(&[], vec![]).unwrap();
        assert_eq!(env.depth(), 2);
    }
}
