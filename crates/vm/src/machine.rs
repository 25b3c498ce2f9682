//! Machine state: control stack, stash, current environment.

use crate::config::VmConfig;
use crate::error::RuntimeError;
use crate::goroutine::Goroutines;
use crate::instruction::Item;
use crate::output::OutputSink;
use crate::waitgroup::{Context, WaitGroup};
use golite_common::{Env, Value};
use std::sync::Arc;

/// State shared by every execution context of one run.
pub(crate) struct Shared {
    pub(crate) config: VmConfig,
    pub(crate) output: Arc<dyn OutputSink>,
    pub(crate) wait_group: WaitGroup,
    /// The program's outermost scope. Goroutine environments extend it.
    pub(crate) globals: Env,
    pub(crate) goroutines: Goroutines,
}

impl Shared {
    pub(crate) fn new(config: VmConfig, output: Arc<dyn OutputSink>, globals: Env) -> Self {
        Self {
            config,
            output,
            wait_group: WaitGroup::new(),
            globals,
            goroutines: Goroutines::default(),
        }
    }
}

/// One execution context: the main program or a single goroutine.
///
/// The control stack and stash are owned by exactly one machine, and a
/// machine is driven by exactly one thread.
pub(crate) struct Machine {
    pub(crate) shared: Arc<Shared>,
    /// Pending commands and instructions; the last element runs next.
    pub(crate) control: Vec<Item>,
    /// Intermediate values; the last element is the top.
    pub(crate) stash: Vec<Value>,
    pub(crate) env: Env,
    /// Steps taken so far.
    pub(crate) steps: u64,
    pub(crate) context: Context,
}

impl Machine {
    pub(crate) fn new(shared: Arc<Shared>, env: Env, control: Vec<Item>) -> Self {
        Self {
            shared,
            control,
            stash: Vec::new(),
            env,
            steps: 0,
            context: Context::Main,
        }
    }

    pub(crate) fn in_goroutine(mut self) -> Self {
        self.context = Context::Goroutine;
        self
    }

    pub(crate) fn config(&self) -> &VmConfig {
        &self.shared.config
    }

    /// Push onto the control stack, checking the depth limit.
    pub(crate) fn schedule(&mut self, item: impl Into<Item>) -> Result<(), RuntimeError> {
        let limit = self.config().max_control_depth;
        if self.control.len() >= limit {
            return Err(RuntimeError::ControlStackOverflow { limit });
        }
        self.control.push(item.into());
        Ok(())
    }

    /// Push several entries; the last one runs first.
    pub(crate) fn schedule_all(
        &mut self,
        items: impl IntoIterator<Item = Item>,
    ) -> Result<(), RuntimeError> {
        for item in items {
            self.schedule(item)?;
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.stash.push(value);
    }

    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stash
            .pop()
            .ok_or(RuntimeError::StashUnderflow { step: self.steps })
    }

    pub(crate) fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stash
            .last()
            .ok_or(RuntimeError::StashUnderflow { step: self.steps })
    }

    /// Pop `arity` values, returned in the order they were pushed.
    pub(crate) fn pop_args(&mut self, arity: usize) -> Result<Vec<Value>, RuntimeError> {
        let len = self.stash.len();
        if len < arity {
            return Err(RuntimeError::StashUnderflow { step: self.steps });
        }
        Ok(self.stash.split_off(len - arity))
    }

    /// Pop a value that must be a boolean. `what` names the consumer for
    /// the error message.
    pub(crate) fn pop_bool(&mut self, what: &str) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::type_error(format!(
                "{what} expects a bool, found {}",
                other.type_name()
            ))),
        }
    }

    /// The single value left when the control stack is empty.
    pub(crate) fn finish(&mut self) -> Result<Value, RuntimeError> {
        match self.stash.len() {
            1 => self.pop(),
            count => Err(RuntimeError::InvariantViolation { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::builtin_env;
    use crate::instruction::Instr;
    use crate::output::BufferSink;

    fn machine() -> Machine {
        let shared = Arc::new(Shared::new(
            VmConfig::default(),
            Arc::new(BufferSink::new()),
            builtin_env(),
        ));
        Machine::new(shared, builtin_env(), Vec::new())
    }

    #[test]
    fn finish_returns_the_single_value() {
        let mut m = machine();
        m.push(Value::Int(7));
        assert_eq!(m.finish(), Ok(Value::Int(7)));
        assert!(m.stash.is_empty());
    }

    #[test]
    fn finish_with_empty_stash_is_invariant_violation() {
        let mut m = machine();
        assert_eq!(
            m.finish(),
            Err(RuntimeError::InvariantViolation { count: 0 })
        );
    }

    #[test]
    fn finish_with_leftover_values_is_invariant_violation() {
        let mut m = machine();
        m.push(Value::Int(1));
        m.push(Value::Int(2));
        assert_eq!(
            m.finish(),
            Err(RuntimeError::InvariantViolation { count: 2 })
        );
        assert_eq!(m.stash.len(), 2);
    }

    #[test]
    fn schedule_respects_the_depth_limit() {
        let mut m = machine();
        m.shared = Arc::new(Shared::new(
            VmConfig::default().with_max_control_depth(1),
            Arc::new(BufferSink::new()),
            builtin_env(),
        ));
        m.schedule(Item::Instr(Instr::Mark)).unwrap();
        assert_eq!(
            m.schedule(Item::Instr(Instr::Mark)),
            Err(RuntimeError::ControlStackOverflow { limit: 1 })
        );
    }
}
