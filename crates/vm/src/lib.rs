//! Golite virtual machine: executes source command trees.
//!
//! The machine is a control-stack/stash evaluator:
//! - A control stack of pending source commands and machine instructions
//! - A stash of intermediate values
//! - An environment chain of shared, mutable frames
//!
//! Source commands are expanded into instructions only when they reach
//! the top of the control stack. Each `go` statement starts a fresh
//! machine on its own thread; the machines of one run share the output
//! sink, the global scope, and a wait-group.
//!
//! # Usage
//!
//! ```
//! use golite_common::command::{binop, lit};
//! use golite_common::{BinaryOp, Program, Value};
//! use golite_vm::run;
//!
//! let program = Program::new(binop(BinaryOp::Add, lit(1), lit(2)));
//! assert_eq!(run(&program).unwrap(), Value::Int(3));
//! ```

pub mod builtins;
pub mod config;
pub mod error;
pub mod output;
pub mod runtime;
pub mod waitgroup;

mod call;
mod compile;
mod execute;
mod goroutine;
mod instruction;
mod machine;
mod ops;

pub use config::VmConfig;
pub use error::RuntimeError;
pub use output::{BufferSink, OutputSink, StdoutSink};
pub use runtime::Runtime;
pub use waitgroup::{Context, WaitGroup};

use golite_common::{Program, Value};

/// Execute a program with the default configuration, printing to
/// standard output.
///
/// # Errors
///
/// Returns [`RuntimeError`] if execution fails (unbound name, type error,
/// step limit, uncaught throw, etc.).
pub fn run(program: &Program) -> Result<Value, RuntimeError> {
    Runtime::default().execute(program)
}
