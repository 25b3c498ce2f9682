//! Golite CLI: run parsed programs.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage, input, or decode error
//! - 3: Runtime error

mod commands;

use clap::{Parser, Subcommand};
use golite_vm::config::{DEFAULT_MAX_CONTROL_DEPTH, DEFAULT_STEP_LIMIT};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "golite", author, version, about = "Run Golite programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a program from its JSON syntax tree
    Run {
        /// Path to the parser's JSON output
        program: PathBuf,
        /// Steps each execution context may take
        #[arg(long, env = "GOLITE_STEP_LIMIT", default_value_t = DEFAULT_STEP_LIMIT)]
        step_limit: u64,
        /// Maximum control-stack entries per execution context
        #[arg(long, env = "GOLITE_MAX_CONTROL_DEPTH", default_value_t = DEFAULT_MAX_CONTROL_DEPTH)]
        max_control_depth: usize,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    init_tracing();

    let result = match cli.command {
        Commands::Run {
            program,
            step_limit,
            max_control_depth,
        } => commands::run(&program, step_limit, max_control_depth),
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

/// Log to stderr, filtered by `RUST_LOG`. Nothing is installed when
/// `RUST_LOG` is unset.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .with(EnvFilter::from_default_env())
            .try_init();
    }
}
