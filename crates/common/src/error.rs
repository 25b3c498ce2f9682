//! Errors raised by the data model: environment access and program loading.

use thiserror::Error;

/// Errors from looking up, assigning, or extending an environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// No frame in the chain binds the name.
    #[error("unbound name `{name}`")]
    Unbound { name: String },

    /// The name is declared in scope but its declaration has not run yet.
    #[error("name `{name}` used before initialization")]
    Unassigned { name: String },

    /// A new frame was requested with mismatched name and value counts.
    #[error("expected {expected} arguments but received {received}")]
    Arity { expected: usize, received: usize },
}

/// Errors from loading a program tree.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input is not a well-formed command tree.
    #[error("malformed program: {0}")]
    Json(#[from] serde_json::Error),
}
