//! Source commands: the tree the parser hands to the machine.
//!
//! Every node is immutable once built and is shared through [`Arc`], so
//! the machine can push the same sub-command onto the control stack as
//! many times as it likes (loop bodies, closure bodies, goroutines)
//! without copying it.
//!
//! The serde representation is the parser's JSON wire format: an object
//! with a `tag` field naming the node kind. Argument and element lists
//! are in source order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Literal payload of a `lit` node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// `null` or a missing `val`.
    #[default]
    Undefined,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-", alias = "-unary")]
    Neg,
    #[serde(rename = "!")]
    Not,
}

/// Binary (strict) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==", alias = "===")]
    Eq,
    #[serde(rename = "!=", alias = "!==")]
    Ne,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A declared parameter of a `func`. The type annotation is carried
/// through from the parser but never checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

/// Shared handle to a command node.
pub type CommandRef = Arc<Command>;

/// One node of the source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum Command {
    Lit {
        #[serde(default)]
        val: Literal,
    },
    Nam {
        sym: String,
    },
    Unop {
        sym: UnaryOp,
        #[serde(rename = "frst")]
        operand: CommandRef,
    },
    Binop {
        sym: BinaryOp,
        #[serde(rename = "frst")]
        lhs: CommandRef,
        #[serde(rename = "scnd")]
        rhs: CommandRef,
    },
    /// `func name(params) { body }`, sugar for a constant lambda.
    Fun {
        sym: String,
        prms: Vec<Param>,
        body: CommandRef,
    },
    Log {
        sym: LogicalOp,
        #[serde(rename = "frst")]
        lhs: CommandRef,
        #[serde(rename = "scnd")]
        rhs: CommandRef,
    },
    CondExpr {
        pred: CommandRef,
        cons: CommandRef,
        alt: CommandRef,
    },
    App {
        #[serde(rename = "fun")]
        callee: CommandRef,
        args: Vec<CommandRef>,
    },
    Assmt {
        sym: String,
        expr: CommandRef,
    },
    Lam {
        prms: Vec<String>,
        body: CommandRef,
    },
    ArrLit {
        elems: Vec<CommandRef>,
    },
    ArrLen {
        expr: CommandRef,
    },
    ArrAcc {
        arr: CommandRef,
        ind: CommandRef,
    },
    ArrAssmt {
        arr: CommandRef,
        ind: CommandRef,
        expr: CommandRef,
    },
    Seq {
        stmts: Vec<CommandRef>,
    },
    CondStmt {
        pred: CommandRef,
        cons: CommandRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<CommandRef>,
    },
    Blk {
        body: CommandRef,
    },
    Let {
        sym: String,
        expr: CommandRef,
    },
    Const {
        sym: String,
        expr: CommandRef,
    },
    Ret {
        expr: CommandRef,
    },
    While {
        pred: CommandRef,
        body: CommandRef,
    },
    For {
        pred: CommandRef,
        body: CommandRef,
    },
    /// `go f(args)`.
    Goroutines {
        #[serde(rename = "fun")]
        callee: CommandRef,
        args: Vec<CommandRef>,
    },
    Try {
        body: CommandRef,
        sym: String,
        #[serde(rename = "catch")]
        handler: CommandRef,
    },
    Throw {
        expr: CommandRef,
    },
    /// Any tag the machine has no handler for.
    #[serde(other)]
    Unrecognized,
}

impl Command {
    /// The wire tag of this node.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Lit { .. } => "lit",
            Command::Nam { .. } => "nam",
            Command::Unop { .. } => "unop",
            Command::Binop { .. } => "binop",
            Command::Fun { .. } => "fun",
            Command::Log { .. } => "log",
            Command::CondExpr { .. } => "cond_expr",
            Command::App { .. } => "app",
            Command::Assmt { .. } => "assmt",
            Command::Lam { .. } => "lam",
            Command::ArrLit { .. } => "arr_lit",
            Command::ArrLen { .. } => "arr_len",
            Command::ArrAcc { .. } => "arr_acc",
            Command::ArrAssmt { .. } => "arr_assmt",
            Command::Seq { .. } => "seq",
            Command::CondStmt { .. } => "cond_stmt",
            Command::Blk { .. } => "blk",
            Command::Let { .. } => "let",
            Command::Const { .. } => "const",
            Command::Ret { .. } => "ret",
            Command::While { .. } => "while",
            Command::For { .. } => "for",
            Command::Goroutines { .. } => "goroutines",
            Command::Try { .. } => "try",
            Command::Throw { .. } => "throw",
            Command::Unrecognized => "unrecognized",
        }
    }
}

// ---- Builders ----
//
// Hosts that embed the machine without the parser (and the tests) build
// trees with these.

pub fn lit(val: impl Into<Literal>) -> CommandRef {
    Arc::new(Command::Lit { val: val.into() })
}

pub fn undefined() -> CommandRef {
    Arc::new(Command::Lit {
        val: Literal::Undefined,
    })
}

pub fn nam(sym: &str) -> CommandRef {
    Arc::new(Command::Nam { sym: sym.into() })
}

pub fn unop(sym: UnaryOp, operand: CommandRef) -> CommandRef {
    Arc::new(Command::Unop { sym, operand })
}

pub fn binop(sym: BinaryOp, lhs: CommandRef, rhs: CommandRef) -> CommandRef {
    Arc::new(Command::Binop { sym, lhs, rhs })
}

pub fn log(sym: LogicalOp, lhs: CommandRef, rhs: CommandRef) -> CommandRef {
    Arc::new(Command::Log { sym, lhs, rhs })
}

pub fn fun(sym: &str, params: &[&str], body: CommandRef) -> CommandRef {
    Arc::new(Command::Fun {
        sym: sym.into(),
        prms: params
            .iter()
            .map(|name| Param {
                name: (*name).into(),
                ty: None,
            })
            .collect(),
        body,
    })
}

pub fn lam(params: &[&str], body: CommandRef) -> CommandRef {
    Arc::new(Command::Lam {
        prms: params.iter().map(|p| (*p).into()).collect(),
        body,
    })
}

pub fn cond_expr(pred: CommandRef, cons: CommandRef, alt: CommandRef) -> CommandRef {
    Arc::new(Command::CondExpr { pred, cons, alt })
}

pub fn cond_stmt(pred: CommandRef, cons: CommandRef, alt: Option<CommandRef>) -> CommandRef {
    Arc::new(Command::CondStmt { pred, cons, alt })
}

pub fn app(callee: CommandRef, args: Vec<CommandRef>) -> CommandRef {
    Arc::new(Command::App { callee, args })
}

/// Call of a named function: `name(args)`.
pub fn call(name: &str, args: Vec<CommandRef>) -> CommandRef {
    app(nam(name), args)
}

pub fn go(name: &str, args: Vec<CommandRef>) -> CommandRef {
    Arc::new(Command::Goroutines {
        callee: nam(name),
        args,
    })
}

pub fn assmt(sym: &str, expr: CommandRef) -> CommandRef {
    Arc::new(Command::Assmt {
        sym: sym.into(),
        expr,
    })
}

pub fn arr_lit(elems: Vec<CommandRef>) -> CommandRef {
    Arc::new(Command::ArrLit { elems })
}

pub fn arr_len(expr: CommandRef) -> CommandRef {
    Arc::new(Command::ArrLen { expr })
}

pub fn arr_acc(arr: CommandRef, ind: CommandRef) -> CommandRef {
    Arc::new(Command::ArrAcc { arr, ind })
}

pub fn arr_assmt(arr: CommandRef, ind: CommandRef, expr: CommandRef) -> CommandRef {
    Arc::new(Command::ArrAssmt { arr, ind, expr })
}

pub fn seq(stmts: Vec<CommandRef>) -> CommandRef {
    Arc::new(Command::Seq { stmts })
}

/// A block around a statement sequence.
pub fn blk(stmts: Vec<CommandRef>) -> CommandRef {
    Arc::new(Command::Blk { body: seq(stmts) })
}

pub fn let_(sym: &str, expr: CommandRef) -> CommandRef {
    Arc::new(Command::Let {
        sym: sym.into(),
        expr,
    })
}

pub fn const_(sym: &str, expr: CommandRef) -> CommandRef {
    Arc::new(Command::Const {
        sym: sym.into(),
        expr,
    })
}

pub fn ret(expr: CommandRef) -> CommandRef {
    Arc::new(Command::Ret { expr })
}

pub fn while_(pred: CommandRef, body: CommandRef) -> CommandRef {
    Arc::new(Command::While { pred, body })
}

pub fn for_(pred: CommandRef, body: CommandRef) -> CommandRef {
    Arc::new(Command::For { pred, body })
}

pub fn try_(body: CommandRef, sym: &str, handler: CommandRef) -> CommandRef {
    Arc::new(Command::Try {
        body,
        sym: sym.into(),
        handler,
    })
}

pub fn throw(expr: CommandRef) -> CommandRef {
    Arc::new(Command::Throw { expr })
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n.into())
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<f64> for Literal {
    fn from(x: f64) -> Self {
        Literal::Float(x)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.into())
    }
}
