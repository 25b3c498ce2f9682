//! Function application and the mark/reset return protocol.
//!
//! A call pushes a `mark_i` under the callee's body; `return` pushes a
//! `reset_i` that discards control entries down to and including the
//! nearest mark. The caller's environment is restored by an `env_i`
//! sitting just below the mark.

use crate::builtins;
use crate::error::RuntimeError;
use crate::instruction::{Instr, Item};
use crate::machine::Machine;
use golite_common::Value;

impl Machine {
    pub(crate) fn exec_app(&mut self, arity: usize) -> Result<(), RuntimeError> {
        let args = self.pop_args(arity)?;
        match self.pop()? {
            Value::Builtin(builtin) => {
                let result = builtins::invoke(&self.shared, self.context, &builtin, args)?;
                self.push(result);
                Ok(())
            }
            Value::Closure(closure) => {
                let extended = closure.env.extend(&closure.params, args)?;
                let tail_frame = match self.control.last() {
                    Some(Item::Instr(Instr::Reset)) => self.tail_call_frame(),
                    _ => None,
                };
                if let Some(mark) = tail_frame {
                    self.control.truncate(mark + 1);
                } else if matches!(self.control.last(), None | Some(Item::Instr(Instr::Env(_)))) {
                    // The caller's environment is restored already.
                    self.schedule(Instr::Mark)?;
                } else {
                    self.schedule(Instr::Env(self.env.clone()))?;
                    self.schedule(Instr::Mark)?;
                }
                self.schedule(closure.body.clone())?;
                self.env = extended;
                Ok(())
            }
            other => Err(RuntimeError::type_error(format!(
                "cannot call a value of type {}",
                other.type_name()
            ))),
        }
    }

    /// Index of the mark owned by the function currently returning, if no
    /// catch marker sits above it.
    fn tail_call_frame(&self) -> Option<usize> {
        for (index, item) in self.control.iter().enumerate().rev() {
            match item {
                Item::Instr(Instr::Mark) => return Some(index),
                Item::Instr(Instr::Catch { .. }) => return None,
                _ => {}
            }
        }
        None
    }

    /// One unwinding step of `return`.
    pub(crate) fn exec_reset(&mut self) {
        match self.control.pop() {
            None | Some(Item::Instr(Instr::Mark)) => {}
            Some(_) => self.control.push(Item::Instr(Instr::Reset)),
        }
    }
}
