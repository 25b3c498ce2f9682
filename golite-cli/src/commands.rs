//! CLI command implementations.

use golite_common::Program;
use golite_vm::{Runtime, VmConfig};
use std::fs;
use std::path::Path;

/// Load a JSON program and execute it.
pub fn run(input: &Path, step_limit: u64, max_control_depth: usize) -> Result<(), i32> {
    let text = fs::read_to_string(input).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", input.display());
        1
    })?;

    let program = Program::from_json(&text).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let config = VmConfig::default()
        .with_step_limit(step_limit)
        .with_max_control_depth(max_control_depth);
    tracing::debug!(input = %input.display(), ?config, "loaded program");

    match Runtime::new(config).execute(&program) {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(3)
        }
    }
}
