//! Main evaluator loop and instruction dispatch.

use crate::error::RuntimeError;
use crate::instruction::{Instr, Item};
use crate::machine::Machine;
use crate::ops;
use golite_common::{Array, Value};

impl Machine {
    /// Step until the control stack is empty, then return the single value
    /// left on the stash.
    pub(crate) fn run(&mut self) -> Result<Value, RuntimeError> {
        let limit = self.config().step_limit;
        while let Some(item) = self.control.pop() {
            if self.steps >= limit {
                return Err(RuntimeError::StepLimitExceeded { limit });
            }
            self.steps += 1;
            tracing::trace!(
                step = self.steps,
                tag = item.tag(),
                control = self.control.len(),
                stash = self.stash.len(),
            );
            match item {
                Item::Cmd(cmd) => self.expand(&cmd)?,
                Item::Instr(instr) => self.exec(instr)?,
            }
        }
        self.finish()
    }

    fn exec(&mut self, instr: Instr) -> Result<(), RuntimeError> {
        match instr {
            Instr::Unop(op) => {
                let operand = self.pop()?;
                self.push(ops::apply_unary(op, operand)?);
            }
            Instr::Binop(op) => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.push(ops::apply_binary(op, lhs, rhs)?);
            }
            Instr::Pop => {
                self.pop()?;
            }
            Instr::Assign { sym } => {
                let value = self.peek()?.clone();
                self.env.assign(&sym, value)?;
            }
            Instr::App { arity } => self.exec_app(arity)?,
            Instr::Branch { cons, alt } => {
                if self.pop_bool("condition")? {
                    self.schedule(cons)?;
                } else if let Some(alt) = alt {
                    self.schedule(alt)?;
                } else {
                    self.push(Value::Undefined);
                }
            }
            Instr::While { pred, body } => {
                if self.pop_bool("loop condition")? {
                    let again = Instr::While {
                        pred: pred.clone(),
                        body: body.clone(),
                    };
                    self.exec_loop_iteration(again, pred, body)?;
                }
            }
            Instr::For { pred, body } => {
                if self.pop_bool("loop condition")? {
                    let again = Instr::For {
                        pred: pred.clone(),
                        body: body.clone(),
                    };
                    self.exec_loop_iteration(again, pred, body)?;
                }
            }
            Instr::Env(env) => self.env = env,
            Instr::ArrLit { arity } => {
                let elements = self.pop_args(arity)?;
                self.push(Value::Array(Array::new(elements)));
            }
            Instr::ArrAcc => {
                let index = self.pop()?;
                let array = self.pop()?;
                let (array, index) = checked_index(array, index)?;
                let value = array.get(index).ok_or(RuntimeError::IndexOutOfRange {
                    index: index as i64,
                    length: array.len(),
                })?;
                self.push(value);
            }
            Instr::ArrAssign => {
                let value = self.pop()?;
                let index = self.pop()?;
                let array = self.pop()?;
                let (array, index) = checked_index(array, index)?;
                if !array.set(index, value.clone()) {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: index as i64,
                        length: array.len(),
                    });
                }
                self.push(value);
            }
            Instr::Mark => {}
            Instr::Reset => self.exec_reset(),
            Instr::Throw => self.exec_throw()?,
            // Reached in normal flow: the guarded body finished without throwing.
            Instr::Catch { .. } => {}
            Instr::Goroutines { arity } => self.exec_go(arity)?,
        }
        Ok(())
    }

    /// Body, then discard its value, then re-test.
    fn exec_loop_iteration(
        &mut self,
        again: Instr,
        pred: golite_common::CommandRef,
        body: golite_common::CommandRef,
    ) -> Result<(), RuntimeError> {
        self.schedule(again)?;
        self.schedule(pred)?;
        self.schedule(Instr::Pop)?;
        self.schedule(body)
    }

    /// Throw unwind: discard one entry per step until a catch marker.
    fn exec_throw(&mut self) -> Result<(), RuntimeError> {
        match self.control.pop() {
            None => {
                let thrown = self.pop()?;
                Err(RuntimeError::UncaughtThrow {
                    value: thrown.to_string(),
                })
            }
            Some(Item::Instr(Instr::Catch {
                sym,
                handler,
                env,
                stash_height,
            })) => {
                let thrown = self.pop()?;
                self.stash.truncate(stash_height);
                self.schedule(Instr::Env(env.clone()))?;
                self.schedule(handler)?;
                self.env = env.extend(&[sym], vec![thrown])?;
                Ok(())
            }
            Some(_) => self.schedule(Instr::Throw),
        }
    }
}

/// Validate an `array[index]` pair.
fn checked_index(array: Value, index: Value) -> Result<(Array, usize), RuntimeError> {
    let array = match array {
        Value::Array(array) => array,
        other => {
            return Err(RuntimeError::type_error(format!(
                "cannot index into {}",
                other.type_name()
            )))
        }
    };
    let index = match index {
        Value::Int(n) => n,
        other => {
            return Err(RuntimeError::type_error(format!(
                "array index must be an int, found {}",
                other.type_name()
            )))
        }
    };
    match usize::try_from(index) {
        Ok(i) if i < array.len() => Ok((array, i)),
        _ => Err(RuntimeError::IndexOutOfRange {
            index,
            length: array.len(),
        }),
    }
}
