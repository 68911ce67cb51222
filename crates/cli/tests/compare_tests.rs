// Integration tests for `jobrecon compare` and `jobrecon validate`.
// Run with: cargo test -p jobrecon-cli --test compare_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn jobrecon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_jobrecon"))
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn run(args: &[&str]) -> Output {
    jobrecon().args(args).output().expect("run jobrecon")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const HEADER: &str = "Equipment Code,Equipment Name,Job Code,Job Title\n";

/// Two vessels: one coarse code vs two finer codes, plus one-sided codes.
fn fleet() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let a = write(
        dir.path(),
        "vessel_a.csv",
        &format!("{HEADER}1234,Purifier,J1,Clean\n601,Main Engine,J2,Overhaul\n"),
    );
    let b = write(
        dir.path(),
        "vessel_b.csv",
        &format!(
            "{HEADER}1234-A,Purifier No.1,J1,Clean\n1234-B,Purifier No.2,J1,Clean\n601,Main Engine,J2,Overhaul\n"
        ),
    );
    (dir, a, b)
}

// ---------------------------------------------------------------------------
// Table output
// ---------------------------------------------------------------------------

#[test]
fn compare_prints_reconciliation_csv() {
    let (_dir, a, b) = fleet();
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Equipment Code,Equipment Name,vessel_a,vessel_b,Mismatch");
    assert_eq!(
        lines[1],
        "1234,\"Purifier, Purifier No.1, Purifier No.2\",Y(1),Y(2),Y"
    );
    assert_eq!(lines[2], "1234-A,Purifier No.1,N,Y(1),Y");
    assert_eq!(lines[3], "1234-B,Purifier No.2,N,Y(1),Y");
    assert_eq!(lines[4], "601,Main Engine,Y(1),Y(1),N");
    assert_eq!(lines.len(), 5);

    assert!(stderr(&output).contains("4 master code(s), 3 mismatch(es)"));
}

#[test]
fn mismatches_only_drops_agreeing_rows() {
    let (_dir, a, b) = fleet();
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--mismatches-only"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 4);
    assert!(!text.contains("\n601,"));
}

#[test]
fn output_flag_writes_file() {
    let (dir, a, b) = fleet();
    let out = dir.path().join("table.csv");
    let output = run(&[
        "compare",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("Equipment Code,Equipment Name,vessel_a,vessel_b,Mismatch\n"));
}

#[test]
fn leading_zero_codes_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", &format!("{HEADER}0601,Engine,J,t\n"));
    let b = write(dir.path(), "b.csv", &format!("{HEADER}601,Engine,J,t\n"));
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap()]);
    let text = stdout(&output);
    assert!(text.contains("\n0601,Engine,Y(1),N,Y\n"));
    assert!(text.contains("\n601,Engine,N,Y(1),Y\n"));
}

// ---------------------------------------------------------------------------
// JSON, drill-down, duplicates
// ---------------------------------------------------------------------------

#[test]
fn json_output_has_table_summary_and_drill_down() {
    let (_dir, a, b) = fleet();
    let output = run(&[
        "compare",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--json",
        "--drill",
        "1234",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(json["summary"]["master_codes"], 4);
    assert_eq!(json["summary"]["mismatches"], 3);
    assert_eq!(json["table"]["sources"][1], "vessel_b");
    assert_eq!(json["table"]["rows"][0]["indicators"][1], "Y(2)");
    assert_eq!(json["table"]["rows"][0]["mismatch"], "Y");
    assert_eq!(json["meta"]["config_name"], "job comparison");

    let drill = &json["drill_down"][0];
    assert_eq!(drill["equipment_code"], "1234");
    assert_eq!(drill["sources"][1]["count"], 2);
    assert_eq!(drill["sources"][1]["jobs"][0]["equipment_name"], "Purifier No.1");
}

#[test]
fn drill_down_goes_to_stderr_in_table_mode() {
    let (_dir, a, b) = fleet();
    let output = run(&[
        "compare",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--drill",
        "1234",
        "--drill",
        "999",
    ]);
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("drill-down 1234:"));
    assert!(err.contains("vessel_b: 2 match(es)"));
    assert!(err.contains("Purifier No.2 / Clean"));
    assert!(err.contains("note: '999' is not a master code"));
}

#[test]
fn duplicates_are_reported_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(
        dir.path(),
        "a.csv",
        &format!("{HEADER}601,Engine,J1,Overhaul\n601,Engine,J1,Overhaul\n602,Engine,J1,Overhaul\n"),
    );
    let b = write(dir.path(), "b.csv", &format!("{HEADER}601,Engine,J1,Overhaul\n"));
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["duplicates"][0]["source"], "a");
    assert_eq!(json["duplicates"][0]["rows"], serde_json::json!([0, 1]));
    assert_eq!(json["duplicates"][1]["rows"], serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn config_supplies_sources_and_policy() {
    let (dir, _a, _b) = fleet();
    let config = write(
        dir.path(),
        "fleet.toml",
        r#"
name = "fleet"

[[sources]]
file = "vessel_a.csv"
name = "Alpha"

[[sources]]
file = "vessel_b.csv"
name = "Bravo"

[compare]
mismatch = "presence"
"#,
    );
    let output = run(&["compare", "--config", config.to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["meta"]["config_name"], "fleet");
    assert_eq!(json["table"]["sources"], serde_json::json!(["Alpha", "Bravo"]));
    // Y(1) vs Y(2) agrees under the presence policy.
    assert_eq!(json["table"]["rows"][0]["mismatch"], "N");
    assert_eq!(json["summary"]["mismatches"], 2);
}

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "ok.toml", "name = \"ok\"\n[taxonomy]\nAP = \"ALL PUMPS\"\n");
    let output = run(&["validate", config.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("valid: 'ok'"));
}

#[test]
fn validate_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "bad.toml", "[taxonomy]\nTOOLONG = \"x\"\n");
    let output = run(&["validate", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("TOOLONG"));
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

#[test]
fn missing_column_exits_4_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "Code,Name\n1,x\n");
    let output = run(&["compare", a.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));
    let err = stderr(&output);
    assert!(err.contains("missing column 'Equipment Code'"));
    assert!(err.contains("hint:"));
}

#[test]
fn unreadable_input_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let output = run(&["compare", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn no_inputs_is_usage_error() {
    let output = run(&["compare"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn duplicate_source_names_exit_3() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "jobs.csv", &format!("{HEADER}1,x,J,t\n"));
    fs::create_dir(dir.path().join("other")).unwrap();
    let b = write(&dir.path().join("other"), "jobs.csv", &format!("{HEADER}1,x,J,t\n"));
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("duplicate source name 'jobs'"));
}

#[test]
fn fail_on_mismatch_exits_6() {
    let (_dir, a, b) = fleet();
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--fail-on-mismatch"]);
    assert_eq!(output.status.code(), Some(6));

    let output = run(&["compare", a.to_str().unwrap(), a.to_str().unwrap(), "--fail-on-mismatch"]);
    // Same file twice collides on source name before any comparison.
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn agreeing_sources_pass_fail_on_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", &format!("{HEADER}601,Engine,J,t\n"));
    let b = write(dir.path(), "b.csv", &format!("{HEADER}601,Engine,J,t\n"));
    let output = run(&["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--fail-on-mismatch"]);
    assert!(output.status.success());
}
