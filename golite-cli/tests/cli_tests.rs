//! Integration tests for the Golite CLI.
//!
//! These tests invoke the `golite` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn golite() -> Command {
    let mut cmd = Command::cargo_bin("golite").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("GOLITE_STEP_LIMIT")
        .env_remove("GOLITE_MAX_CONTROL_DEPTH");
    cmd
}

/// Write `json` to a program file inside `dir`.
fn program_file(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("program.json");
    fs::write(&path, json).unwrap();
    path
}

const ADD_PROGRAM: &str = r#"{"tag":"blk","body":{"tag":"seq","stmts":[
    {"tag":"fun","sym":"add","prms":[{"name":"a","type":"int"},{"name":"b","type":"int"}],
     "body":{"tag":"blk","body":{"tag":"app","fun":{"tag":"nam","sym":"print"},
       "args":[{"tag":"binop","sym":"+","frst":{"tag":"nam","sym":"a"},"scnd":{"tag":"nam","sym":"b"}}]}}},
    {"tag":"app","fun":{"tag":"nam","sym":"add"},"args":[{"tag":"lit","val":1},{"tag":"lit","val":2}]}
]}}"#;

const FOREVER: &str = r#"{"tag":"blk","body":{"tag":"while",
    "pred":{"tag":"lit","val":true},"body":{"tag":"blk","body":{"tag":"seq","stmts":[]}}}}"#;

// ---- Usage ----

#[test]
fn no_args_exits_1() {
    golite()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag_exits_0() {
    golite()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"));
}

#[test]
fn unknown_command_exits_1() {
    golite().arg("frobnicate").assert().failure().code(1);
}

// ---- Run ----

#[test]
fn run_prints_output_then_value() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, ADD_PROGRAM);
    golite()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout("3\nundefined\n");
}

#[test]
fn run_missing_file_exits_1() {
    golite()
        .args(["run", "/nonexistent/program.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn run_malformed_json_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, "{\"tag\":");
    golite()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("malformed program"));
}

#[test]
fn runtime_error_exits_3() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, r#"{"tag":"nam","sym":"missing"}"#);
    golite()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("unbound name `missing`"));
}

#[test]
fn step_limit_flag() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, FOREVER);
    golite()
        .args(["run", "--step-limit", "500"])
        .arg(&path)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("step limit 500 exceeded"));
}

#[test]
fn step_limit_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, FOREVER);
    golite()
        .env("GOLITE_STEP_LIMIT", "200")
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("step limit 200 exceeded"));
}

#[test]
fn max_control_depth_flag() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, ADD_PROGRAM);
    golite()
        .args(["run", "--max-control-depth", "2"])
        .arg(&path)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("control stack overflow"));
}

#[test]
fn rust_log_writes_to_stderr_only() {
    let dir = TempDir::new().unwrap();
    let path = program_file(&dir, ADD_PROGRAM);
    golite()
        .env("RUST_LOG", "golite_vm=debug")
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout("3\nundefined\n")
        .stderr(predicate::str::contains("run started"));
}
