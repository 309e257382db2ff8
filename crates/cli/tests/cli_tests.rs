// End-to-end tests of the tagtrend binary against a CSV source in a temp dir.
//
// Run with: cargo test -p tagtrend-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CONFIG: &str = r#"
source = "orders.csv"

[[filter_groups]]
tag = "east"
[filter_groups.conditions]
region = "east"

[[filter_groups]]
tag = "open"
[filter_groups.conditions]
status = [1]
"#;

fn tagtrend(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tagtrend"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("TAGTREND_CONFIG")
        .args(args)
        .output()
        .expect("run tagtrend")
}

fn workspace(csv: &str, config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("orders.csv"), csv).unwrap();
    fs::write(dir.path().join("tagtrend.toml"), config).unwrap();
    dir
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn history(dir: &Path) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(dir.join("result/history.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn run_writes_snapshot_history_and_registry() {
    let dir = workspace("region,status\neast,1\nwest,2\neast,2\n", CONFIG);
    let output = tagtrend(dir.path(), &["run", "--date", "2026-03-10"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("[orders@2026-03-10] east: matched count = 2"), "stderr: {err}");
    assert!(err.contains("[orders@2026-03-10] open: matched count = 1"), "stderr: {err}");
    assert!(err.contains("wrote 2 record(s)"), "stderr: {err}");

    assert!(dir.path().join("snapshot_cache/orders/orders/2026-03-10.csv").is_file());
    assert!(dir.path().join("config/last_tags.toml").is_file());

    let records = history(dir.path());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["tag"], "east");
    assert_eq!(records[0]["date"], "2026-03-10");
    assert_eq!(records[0]["matched_count"], 2);
}

#[test]
fn changed_tag_recomputes_earlier_days() {
    let dir = workspace("region,status\neast,1\nwest,2\n", CONFIG);
    assert!(tagtrend(dir.path(), &["run", "--date", "2026-03-09"]).status.success());

    fs::write(dir.path().join("orders.csv"), "region,status\neast,1\nwest,2\nwest,1\n").unwrap();
    let widened = CONFIG.replace("region = \"east\"", "region = [\"east\", \"west\"]");
    fs::write(dir.path().join("tagtrend.toml"), widened).unwrap();
    let output = tagtrend(dir.path(), &["run", "--date", "2026-03-10"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let east: Vec<_> = history(dir.path())
        .into_iter()
        .filter(|r| r["tag"] == "east")
        .map(|r| (r["date"].as_str().unwrap().to_string(), r["matched_count"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        east,
        vec![("2026-03-09".to_string(), 2), ("2026-03-10".to_string(), 3)]
    );
}

#[test]
fn run_json_is_a_single_report() {
    let dir = workspace("region,status\neast,1\n", CONFIG);
    let output = tagtrend(dir.path(), &["run", "--date", "2026-03-10", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["table_id"], "orders");
    assert_eq!(report["records_written"], 2);
    assert_eq!(report["registry_updated"], true);
}

#[test]
fn missing_column_is_a_diagnostic_not_an_error() {
    let config = format!("{CONFIG}\n[[filter_groups]]\ntag = \"bogus\"\nconditions = {{ nope = \"x\" }}\n");
    let dir = workspace("region,status\neast,1\n", &config);
    let output = tagtrend(dir.path(), &["run", "--date", "2026-03-10"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("bogus: column 'nope' not found, condition skipped"), "stderr: {err}");
    assert!(err.contains("bogus: invalid query, all conditions skipped"), "stderr: {err}");
    assert!(history(dir.path()).iter().all(|r| r["tag"] != "bogus"));
}

#[test]
fn unknown_sheet_exits_4() {
    let config = format!("sheet = \"Missing\"\n{CONFIG}");
    let dir = workspace("region,status\neast,1\n", &config);
    let output = tagtrend(dir.path(), &["run"]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("sheet 'Missing' not found"));
    assert!(!dir.path().join("result/history.json").exists());
}

#[test]
fn invalid_config_exits_3() {
    let dir = workspace("region\neast\n", "source = \"orders.csv\"\n");
    let output = tagtrend(dir.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(3));

    let empty = tempfile::tempdir().unwrap();
    let output = tagtrend(empty.path(), &["run"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn unreadable_source_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tagtrend.toml"), CONFIG.replace("orders.csv", "absent.xlsx")).unwrap();
    let output = tagtrend(dir.path(), &["run"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn validate_reports_sheets() {
    let dir = workspace("region,status\neast,1\n", CONFIG);
    let output = tagtrend(dir.path(), &["validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("valid: 2 filter group(s) over 'orders'"));
}

#[test]
fn signatures_track_changes() {
    let dir = workspace("region,status\neast,1\n", CONFIG);

    let before = tagtrend(dir.path(), &["signatures", "--json"]);
    let listing: serde_json::Value = serde_json::from_slice(&before.stdout).unwrap();
    assert_eq!(listing["tags"][0]["status"], "new_or_changed");

    assert!(tagtrend(dir.path(), &["run", "--date", "2026-03-10"]).status.success());
    let after = tagtrend(dir.path(), &["signatures", "--json"]);
    let listing: serde_json::Value = serde_json::from_slice(&after.stdout).unwrap();
    assert_eq!(listing["tags"][0]["status"], "unchanged");
    assert_eq!(listing["tags"][0]["signature"].as_str().unwrap().len(), 64);
    assert_eq!(listing["removed"], serde_json::json!([]));
}

#[test]
fn report_shows_delta() {
    let dir = workspace("region,status\neast,1\n", CONFIG);
    assert!(tagtrend(dir.path(), &["run", "--date", "2026-03-09"]).status.success());
    fs::write(dir.path().join("orders.csv"), "region,status\neast,1\neast,2\neast,2\n").unwrap();
    assert!(tagtrend(dir.path(), &["run", "--date", "2026-03-10"]).status.success());

    let output = tagtrend(dir.path(), &["report", "--date", "2026-03-10", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["previous_date"], "2026-03-09");
    let east = &summary["tags"][0];
    assert_eq!(east["tag"], "east");
    assert_eq!(east["today"], 3);
    assert_eq!(east["delta"], 2);
}

#[test]
fn backdated_run_keeps_existing_snapshot() {
    let dir = workspace("region,status\neast,1\n", CONFIG);
    assert!(tagtrend(dir.path(), &["run", "--date", "2026-03-09"]).status.success());
    let snapshot = dir.path().join("snapshot_cache/orders/orders/2026-03-09.csv");
    let before = fs::read_to_string(&snapshot).unwrap();

    fs::write(dir.path().join("orders.csv"), "region,status\nwest,2\nwest,2\n").unwrap();
    let output = tagtrend(dir.path(), &["run", "--date", "2026-03-09"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("past snapshots are immutable"), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), before);
    assert!(history(dir.path()).iter().all(|r| r["matched_count"] != 0));
}
