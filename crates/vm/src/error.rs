//! Runtime errors for the Golite machine.
//!
//! Every error aborts the execution context that raised it. Errors raised
//! inside a goroutine are reported to the spawning run as
//! [`RuntimeError::GoroutineFailed`].

use golite_common::EnvError;
use thiserror::Error;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// No frame in the environment chain binds the name.
    #[error("unbound name `{name}`")]
    UnboundName { name: String },

    /// The name is declared in scope but read before its declaration ran.
    #[error("name `{name}` used before initialization")]
    UnassignedName { name: String },

    /// A call or frame extension with the wrong number of arguments.
    #[error("expected {expected} arguments but received {received}")]
    ArityMismatch { expected: usize, received: usize },

    /// An operator, branch, or call applied to the wrong kind of value.
    #[error("type error: {message}")]
    TypeError { message: String },

    /// Array access or assignment outside `[0, length)`.
    #[error("array index {index} out of range (length {length})")]
    IndexOutOfRange { index: i64, length: usize },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A control-stack entry with no handler.
    #[error("unknown instruction `{tag}`")]
    UnknownInstruction { tag: String },

    /// The runaway-step guard tripped.
    #[error("step limit {limit} exceeded")]
    StepLimitExceeded { limit: u64 },

    /// The control stack grew past its configured depth.
    #[error("control stack overflow (limit {limit})")]
    ControlStackOverflow { limit: usize },

    /// An instruction popped from an empty stash.
    #[error("stash underflow at step {step}")]
    StashUnderflow { step: u64 },

    /// The stash did not hold exactly one value at termination.
    #[error("internal error: stash must hold exactly one value but holds {count}")]
    InvariantViolation { count: usize },

    /// A thrown value reached the bottom of the control stack.
    #[error("uncaught throw: {value}")]
    UncaughtThrow { value: String },

    /// `waitGroupAdd` drove the counter below zero.
    #[error("negative wait-group counter {counter}")]
    WaitGroupMisuse { counter: i64 },

    /// `waitGroupWait` with a non-zero counter and nothing left running.
    #[error("deadlock: waiting on counter {counter} with no running goroutines")]
    Deadlock { counter: i64 },

    /// The host refused to start a goroutine thread.
    #[error("failed to spawn goroutine: {message}")]
    SpawnFailed { message: String },

    /// A goroutine aborted with an error.
    #[error("goroutine {id} failed: {source}")]
    GoroutineFailed {
        id: u64,
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
        }
    }
}

impl From<EnvError> for RuntimeError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::Unbound { name } => RuntimeError::UnboundName { name },
            EnvError::Unassigned { name } => RuntimeError::UnassignedName { name },
            EnvError::Arity { expected, received } => {
                RuntimeError::ArityMismatch { expected, received }
            }
        }
    }
}
