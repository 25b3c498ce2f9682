//! Compile on demand: expansion of source commands.
//!
//! A source command popped from the control stack is replaced by the
//! machine instructions and sub-commands that implement it. Nothing is
//! cached; a loop body is expanded again on every iteration.

use crate::error::RuntimeError;
use crate::instruction::{Instr, Item};
use crate::machine::Machine;
use golite_common::command::{self, Command, CommandRef, LogicalOp};
use golite_common::{Closure, Value};
use std::sync::Arc;

impl Machine {
    pub(crate) fn expand(&mut self, cmd: &CommandRef) -> Result<(), RuntimeError> {
        match &**cmd {
            Command::Lit { val } => {
                self.push(Value::from(val));
                Ok(())
            }
            Command::Nam { sym } => {
                let value = self.env.lookup(sym)?;
                self.push(value);
                Ok(())
            }
            Command::Unop { sym, operand } => {
                self.schedule(Instr::Unop(*sym))?;
                self.schedule(operand.clone())
            }
            Command::Binop { sym, lhs, rhs } => {
                self.schedule(Instr::Binop(*sym))?;
                self.schedule(rhs.clone())?;
                self.schedule(lhs.clone())
            }
            Command::Fun { sym, prms, body } => {
                let lambda = Arc::new(Command::Lam {
                    prms: prms.iter().map(|p| p.name.clone()).collect(),
                    body: body.clone(),
                });
                self.schedule(Arc::new(Command::Const {
                    sym: sym.clone(),
                    expr: lambda,
                }))
            }
            Command::Log { sym, lhs, rhs } => {
                let (cons, alt) = match sym {
                    LogicalOp::And => (rhs.clone(), command::lit(false)),
                    LogicalOp::Or => (command::lit(true), rhs.clone()),
                };
                self.schedule(command::cond_expr(lhs.clone(), cons, alt))
            }
            Command::CondExpr { pred, cons, alt } => {
                self.schedule(Instr::Branch {
                    cons: cons.clone(),
                    alt: Some(alt.clone()),
                })?;
                self.schedule(pred.clone())
            }
            Command::CondStmt { pred, cons, alt } => {
                self.schedule(Instr::Branch {
                    cons: cons.clone(),
                    alt: alt.clone(),
                })?;
                self.schedule(pred.clone())
            }
            Command::App { callee, args } => {
                self.schedule(Instr::App { arity: args.len() })?;
                self.schedule_call_operands(callee, args)
            }
            Command::Goroutines { callee, args } => {
                self.schedule(Instr::Goroutines { arity: args.len() })?;
                self.schedule_call_operands(callee, args)
            }
            Command::Assmt { sym, expr } => {
                self.schedule(Instr::Assign { sym: sym.clone() })?;
                self.schedule(expr.clone())
            }
            Command::Lam { prms, body } => {
                self.push(Value::Closure(Arc::new(Closure {
                    params: prms.clone(),
                    body: body.clone(),
                    env: self.env.clone(),
                })));
                Ok(())
            }
            Command::ArrLit { elems } => {
                self.schedule(Instr::ArrLit {
                    arity: elems.len(),
                })?;
                self.schedule_all(elems.iter().rev().cloned().map(Item::Cmd))
            }
            Command::ArrLen { expr } => {
                self.schedule(command::call("array_length", vec![expr.clone()]))
            }
            Command::ArrAcc { arr, ind } => {
                self.schedule(Instr::ArrAcc)?;
                self.schedule(ind.clone())?;
                self.schedule(arr.clone())
            }
            Command::ArrAssmt { arr, ind, expr } => {
                self.schedule(Instr::ArrAssign)?;
                self.schedule(expr.clone())?;
                self.schedule(ind.clone())?;
                self.schedule(arr.clone())
            }
            Command::Seq { stmts } => self.schedule_all(sequence(stmts)),
            Command::Blk { body } => {
                let locals = scan_locals(body);
                let unassigned = vec![Value::Unassigned; locals.len()];
                if !self.control.is_empty() {
                    self.schedule(Instr::Env(self.env.clone()))?;
                }
                self.schedule(body.clone())?;
                self.env = self.env.extend(&locals, unassigned)?;
                Ok(())
            }
            Command::Let { sym, expr } | Command::Const { sym, expr } => {
                self.schedule(command::undefined())?;
                self.schedule(Instr::Pop)?;
                self.schedule(Instr::Assign { sym: sym.clone() })?;
                self.schedule(expr.clone())
            }
            Command::Ret { expr } => {
                self.schedule(Instr::Reset)?;
                self.schedule(expr.clone())
            }
            Command::While { pred, body } => {
                self.schedule(command::undefined())?;
                self.schedule(Instr::While {
                    pred: pred.clone(),
                    body: body.clone(),
                })?;
                self.schedule(pred.clone())
            }
            Command::For { pred, body } => {
                self.schedule(command::undefined())?;
                self.schedule(Instr::For {
                    pred: pred.clone(),
                    body: body.clone(),
                })?;
                self.schedule(pred.clone())
            }
            Command::Try { body, sym, handler } => {
                self.schedule(Instr::Catch {
                    sym: sym.clone(),
                    handler: handler.clone(),
                    env: self.env.clone(),
                    stash_height: self.stash.len(),
                })?;
                self.schedule(body.clone())
            }
            Command::Throw { expr } => {
                self.schedule(Instr::Throw)?;
                self.schedule(expr.clone())
            }
            Command::Unrecognized => Err(RuntimeError::UnknownInstruction {
                tag: cmd.tag().to_string(),
            }),
        }
    }

    /// Arguments right to left, then the callee, so the callee is
    /// evaluated first and arguments left to right.
    fn schedule_call_operands(
        &mut self,
        callee: &CommandRef,
        args: &[CommandRef],
    ) -> Result<(), RuntimeError> {
        self.schedule_all(args.iter().rev().cloned().map(Item::Cmd))?;
        self.schedule(callee.clone())
    }
}

/// Statements interleaved with `pop_i`, in push order: only the last
/// statement's value survives. An empty sequence yields undefined.
pub(crate) fn sequence(stmts: &[CommandRef]) -> Vec<Item> {
    if stmts.is_empty() {
        return vec![Item::Cmd(command::undefined())];
    }
    let mut items = Vec::with_capacity(stmts.len() * 2);
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            items.push(Item::Instr(Instr::Pop));
        }
        items.push(Item::Cmd(stmt.clone()));
    }
    items.reverse();
    items
}

/// Names declared directly in a block: `let`, `const` and `func`
/// statements, looking through nested sequences but not nested blocks.
pub(crate) fn scan_locals(body: &Command) -> Vec<String> {
    let mut names = Vec::new();
    collect_locals(body, &mut names);
    names
}

fn collect_locals(cmd: &Command, names: &mut Vec<String>) {
    match cmd {
        Command::Seq { stmts } => {
            for stmt in stmts {
                collect_locals(stmt, names);
            }
        }
        Command::Let { sym, .. } | Command::Const { sym, .. } | Command::Fun { sym, .. } => {
            if !names.contains(sym) {
                names.push(sym.clone());
            }
        }
        _ => {}
    }
}
