//! Control-stack entries.
//!
//! The control stack holds two kinds of entries: source commands, which
//! are expanded when popped, and machine instructions, which carry exactly
//! the operands their handler needs.

use golite_common::{BinaryOp, CommandRef, Env, UnaryOp};
use std::fmt;

/// One entry of the control stack.
#[derive(Clone)]
pub enum Item {
    Cmd(CommandRef),
    Instr(Instr),
}

/// Machine instructions.
#[derive(Clone)]
pub enum Instr {
    /// Apply a unary operator to the top of the stash.
    Unop(UnaryOp),
    /// Apply a binary operator to the top two stash values.
    Binop(BinaryOp),
    /// Discard the top of the stash.
    Pop,
    /// Store the top of the stash (left in place) into `sym`.
    Assign { sym: String },
    /// Call the callee under `arity` arguments.
    App { arity: usize },
    /// Pop a boolean and continue with `cons` or `alt`.
    Branch {
        cons: CommandRef,
        alt: Option<CommandRef>,
    },
    While { pred: CommandRef, body: CommandRef },
    For { pred: CommandRef, body: CommandRef },
    /// Restore a saved environment.
    Env(Env),
    ArrLit { arity: usize },
    ArrAcc,
    ArrAssign,
    /// Call marker delimiting one function call.
    Mark,
    /// Return unwind: discard entries up to the nearest call marker.
    Reset,
    /// Throw unwind: discard entries up to the nearest catch marker.
    Throw,
    /// Catch marker for a `try`.
    Catch {
        sym: String,
        handler: CommandRef,
        env: Env,
        stash_height: usize,
    },
    /// Spawn the callee under `arity` arguments as a goroutine.
    Goroutines { arity: usize },
}

impl Item {
    /// Tag used in traces.
    pub fn tag(&self) -> &'static str {
        match self {
            Item::Cmd(cmd) => cmd.tag(),
            Item::Instr(instr) => instr.tag(),
        }
    }
}

impl Instr {
    pub fn tag(&self) -> &'static str {
        match self {
            Instr::Unop(_) => "unop_i",
            Instr::Binop(_) => "binop_i",
            Instr::Pop => "pop_i",
            Instr::Assign { .. } => "assmt_i",
            Instr::App { .. } => "app_i",
            Instr::Branch { .. } => "branch_i",
            Instr::While { .. } => "while_i",
            Instr::For { .. } => "for_i",
            Instr::Env(_) => "env_i",
            Instr::ArrLit { .. } => "arr_lit_i",
            Instr::ArrAcc => "arr_acc_i",
            Instr::ArrAssign => "arr_assmt_i",
            Instr::Mark => "mark_i",
            Instr::Reset => "reset_i",
            Instr::Throw => "throw_i",
            Instr::Catch { .. } => "catch_i",
            Instr::Goroutines { .. } => "goroutines_i",
        }
    }
}

impl From<CommandRef> for Item {
    fn from(cmd: CommandRef) -> Self {
        Item::Cmd(cmd)
    }
}

impl From<Instr> for Item {
    fn from(instr: Instr) -> Self {
        Item::Instr(instr)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Cmd(cmd) => write!(f, "Cmd({})", cmd.tag()),
            Item::Instr(instr) => write!(f, "{instr:?}"),
        }
    }
}

impl fmt::Debug for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Unop(op) => write!(f, "unop_i({op})"),
            Instr::Binop(op) => write!(f, "binop_i({op})"),
            Instr::Assign { sym } => write!(f, "assmt_i({sym})"),
            Instr::App { arity } => write!(f, "app_i({arity})"),
            Instr::ArrLit { arity } => write!(f, "arr_lit_i({arity})"),
            Instr::Catch { sym, .. } => write!(f, "catch_i({sym})"),
            Instr::Goroutines { arity } => write!(f, "goroutines_i({arity})"),
            other => f.write_str(other.tag()),
        }
    }
}
