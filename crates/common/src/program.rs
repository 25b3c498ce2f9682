//! Program representation: the statement tree of one source file.
//!
//! The parser wraps the top-level statements in a `blk`. The machine
//! creates that outermost scope itself (it becomes the global scope that
//! goroutines extend), so a program stores the block's body.

use crate::command::{Command, CommandRef};
use crate::error::DecodeError;
use std::sync::Arc;

/// A parsed program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    body: CommandRef,
}

impl Program {
    /// Create a program from a root command. A root `blk` is unwrapped;
    /// anything else is taken as the body.
    pub fn new(root: CommandRef) -> Self {
        let body = match &*root {
            Command::Blk { body } => body.clone(),
            _ => root,
        };
        Self { body }
    }

    /// Load a program from the parser's JSON output.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let root: Command = serde_json::from_str(text)?;
        Ok(Self::new(Arc::new(root)))
    }

    /// The statements of the outermost scope.
    pub fn body(&self) -> &CommandRef {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{blk, call, lit, seq};

    #[test]
    fn root_block_is_unwrapped() {
        let program = Program::new(blk(vec![lit(1)]));
        assert_eq!(program.body(), &seq(vec![lit(1)]));
    }

    #[test]
    fn bare_statement_is_the_body() {
        let program = Program::new(call("print", vec![lit(1)]));
        assert_eq!(program.body(), &call("print", vec![lit(1)]));
    }

    #[test]
    fn from_json_roundtrips_parser_output() {
        let program = Program::from_json(
            r#"{"tag":"blk","body":{"tag":"seq","stmts":[
                {"tag":"app","fun":{"tag":"nam","sym":"print"},"args":[{"tag":"lit","val":1}]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(program.body(), &seq(vec![call("print", vec![lit(1)])]));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(Program::from_json("not json").is_err());
        assert!(Program::from_json(r#"{"tag":"nam"}"#).is_err());
    }
}
