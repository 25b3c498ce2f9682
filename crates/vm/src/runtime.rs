//! Entry point for running a whole program.

use crate::builtins::builtin_env;
use crate::compile::scan_locals;
use crate::config::VmConfig;
use crate::error::RuntimeError;
use crate::instruction::Item;
use crate::machine::{Machine, Shared};
use crate::output::{OutputSink, StdoutSink};
use golite_common::{Program, Value};
use std::sync::Arc;

/// Runs programs with a fixed configuration and output sink.
///
/// Each call to [`Runtime::execute`] gets its own wait-group and global
/// scope; nothing carries over between runs.
pub struct Runtime {
    config: VmConfig,
    output: Arc<dyn OutputSink>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl Runtime {
    /// A runtime printing to standard output.
    pub fn new(config: VmConfig) -> Self {
        Self {
            config,
            output: Arc::new(StdoutSink),
        }
    }

    /// Replace the output sink.
    pub fn with_output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = output;
        self
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Run `program` to completion and return the final value.
    ///
    /// Goroutines still running when the main program finishes are joined
    /// before this returns. A goroutine left waiting on the wait-group with
    /// nothing to release it fails with `Deadlock`. An error in the main program is reported in
    /// preference to a goroutine failure.
    ///
    /// # Errors
    ///
    /// Any [`RuntimeError`] raised by the main program, or
    /// [`RuntimeError::GoroutineFailed`] for the first goroutine that
    /// failed.
    pub fn execute(&self, program: &Program) -> Result<Value, RuntimeError> {
        let locals = scan_locals(program.body());
        let unassigned = vec![Value::Unassigned; locals.len()];
        let globals = builtin_env().extend(&locals, unassigned)?;
        let shared = Arc::new(Shared::new(
            self.config,
            Arc::clone(&self.output),
            globals.clone(),
        ));

        tracing::debug!(
            step_limit = self.config.step_limit,
            max_control_depth = self.config.max_control_depth,
            globals = locals.len(),
            "run started"
        );
        let mut main = Machine::new(
            Arc::clone(&shared),
            globals,
            vec![Item::Cmd(program.body().clone())],
        );
        let result = main.run();
        // Goroutines blocked in `waitGroupWait` can no longer be released
        // by the main program.
        shared.wait_group.close();
        shared.goroutines.join_all();
        tracing::debug!(steps = main.steps, ok = result.is_ok(), "run finished");

        let value = result?;
        match shared.goroutines.first_failure() {
            Some((id, source)) => Err(RuntimeError::GoroutineFailed {
                id,
                source: Box::new(source),
            }),
            None => Ok(value),
        }
    }
}
