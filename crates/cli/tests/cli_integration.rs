use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("scriptargs-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn scriptargs() -> Command {
    Command::new(env!("CARGO_BIN_EXE_scriptargs"))
}

fn run_with_schema(prefix: &str, schema: &str, tokens: &[&str]) -> (Output, PathBuf) {
    let dir = make_temp_dir(prefix);
    let schema_path = dir.join("schema.json");
    fs::write(&schema_path, schema).expect("failed to write schema");

    let out = scriptargs()
        .arg("--schema")
        .arg(&schema_path)
        .args(tokens)
        .output()
        .expect("failed to run scriptargs");
    (out, dir)
}

fn stdout_json(out: &Output) -> serde_json::Value {
    serde_json::from_slice(&out.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}):\n{}",
            String::from_utf8_lossy(&out.stdout)
        )
    })
}

#[test]
fn help_works() {
    let out = scriptargs()
        .arg("--help")
        .output()
        .expect("failed to run scriptargs --help");
    assert!(
        out.status.success(),
        "scriptargs --help failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("scriptargs") && stdout.contains("--schema"),
        "unexpected help output:\n{stdout}"
    );
}

#[test]
fn parses_an_r_style_invocation() {
    let schema = r#"{
        "name": "greet",
        "args": [
            {"name": "name", "help": "who to greet"},
            {"name": "count", "type": "integer", "default": 1}
        ]
    }"#;
    let (out, dir) = run_with_schema(
        "r-style",
        schema,
        &[
            "/usr/bin/R",
            "--slave",
            "--file=script.R",
            "--args",
            "--name",
            "alice",
            "--count",
            "3",
        ],
    );

    assert!(
        out.status.success(),
        "scriptargs failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let report = stdout_json(&out);
    assert_eq!(report["script"], "script.R");
    assert_eq!(report["options"], serde_json::json!(["--slave"]));
    assert_eq!(report["ok"]["name"], true);
    assert_eq!(report["ok"]["count"], true);
    assert_eq!(report["values"]["name"], "alice");
    assert_eq!(report["values"]["count"], 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_required_argument_fails_the_exit_code() {
    let schema = r#"{
        "args": [
            {"name": "input", "required": true}
        ]
    }"#;
    let (out, dir) = run_with_schema("required", schema, &["/usr/bin/R", "--args"]);

    assert!(
        !out.status.success(),
        "expected a failure exit code, got: {}",
        out.status
    );
    let report = stdout_json(&out);
    assert_eq!(report["ok"]["input"], false);
    assert_eq!(report["values"]["input"], serde_json::Value::Null);

    // The diagnostic must not contaminate the JSON report on stdout.
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("required flag --input is missing"),
        "diagnostic missing from stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn choice_violation_keeps_the_default_value() {
    let schema = r#"{
        "args": [
            {"name": "level", "type": "integer", "choices": [1, 2, 3], "default": 1}
        ]
    }"#;
    let (out, dir) = run_with_schema(
        "choices",
        schema,
        &["/usr/bin/R", "--args", "--level", "5"],
    );

    assert!(!out.status.success());
    let report = stdout_json(&out);
    assert_eq!(report["ok"]["level"], false);
    assert_eq!(report["values"]["level"], 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn greedy_arity_stops_at_the_next_flag() {
    let schema = r#"{
        "args": [
            {"name": "list", "nargs": -1},
            {"name": "other"}
        ]
    }"#;
    let (out, dir) = run_with_schema(
        "greedy",
        schema,
        &["/usr/bin/R", "--args", "--list", "a", "b", "--other", "x"],
    );

    assert!(out.status.success());
    let report = stdout_json(&out);
    assert_eq!(report["values"]["list"], serde_json::json!(["a", "b"]));
    assert_eq!(report["values"]["other"], "x");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invocation_help_flag_prints_usage_to_stderr() {
    let schema = r#"{
        "name": "greet",
        "args": [
            {"name": "name", "help": "who to greet"}
        ]
    }"#;
    let (out, dir) = run_with_schema(
        "invocation-help",
        schema,
        &["/usr/bin/R", "--args", "-h"],
    );

    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("Usage: greet") && stderr.contains("--name"),
        "unexpected usage output:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rejects_an_invalid_schema() {
    let (out, dir) = run_with_schema("bad-schema", "{ not json", &["/usr/bin/R", "--args"]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("invalid schema"),
        "unexpected error output:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
