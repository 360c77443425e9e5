use assert_cmd::Command;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write_step_test(dir: &tempfile::TempDir) -> PathBuf {
    let mut csv = String::from("Time (min),Level (%),Valve (%)\n");
    for i in 0..=40 {
        let t = f64::from(i);
        let pv = if t <= 12.0 { 5.0 } else { 5.0 + (t - 12.0) };
        let cv = if t <= 10.0 { 50.0 } else { 60.0 };
        csv.push_str(&format!("{t},{pv},{cv}\n"));
    }
    let path = dir.path().join("step.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn events(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}

fn find<'a>(events: &'a [Value], name: &str) -> &'a Value {
    events
        .iter()
        .find(|v| v["event"] == name)
        .unwrap_or_else(|| panic!("no {name} event in {events:?}"))
}

/// Validate the JSONL schema for a complete session.
#[rstest]
fn jsonl_session_schema() {
    let dir = tempdir().unwrap();
    let data = write_step_test(&dir);

    let mut cmd = Command::cargo_bin("tuner_cli").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("tune")
        .arg("--data")
        .arg(&data)
        .write_stdin("cursors\ncursor 0\ncursor 10\ncursor 20\ncursor 40\ncursor 41\ncalc\nlambda 10\nshow\n");

    let out = cmd.assert().success().get_output().stdout.clone();
    let ev = events(&out);

    let loaded = find(&ev, "loaded");
    assert_eq!(loaded["samples"], 41);
    assert_eq!(loaded["units"]["time"], "min");

    let cursors: Vec<&Value> = ev.iter().filter(|v| v["event"] == "cursor").collect();
    assert_eq!(cursors.len(), 4);
    assert_eq!(cursors[3]["complete"], true);
    assert_eq!(find(&ev, "cursor_ignored")["x"], 41.0);

    let params = find(&ev, "parameters");
    for key in [
        "slope1",
        "slope2",
        "pv_transition",
        "cv_transition",
        "delta_output",
        "dead_time",
        "process_gain",
        "min_lambda",
    ] {
        assert!(params[key].as_f64().is_some(), "{key} should be a number");
    }
    assert!(params["prompt"].as_str().unwrap().contains("(units: min)"));

    let gains = find(&ev, "gains");
    assert!((gains["integral_time"].as_f64().unwrap() - 22.0).abs() < 1e-9);
    assert!(gains["warning"].is_null());

    // Readouts carry both the raw and the rounded value
    let show = find(&ev, "readouts");
    assert_eq!(show["phase"], "gains ready");
    let rows = show["readouts"].as_array().unwrap();
    assert_eq!(rows.len(), 9);
    for row in rows {
        assert!(row["key"].is_string());
        assert!(row["label"].is_string());
        assert!(row["unit"].is_string());
        assert!(row["value"].as_f64().is_some());
        assert!(row["rounded"].as_f64().is_some());
    }
    let td = rows.iter().find(|r| r["key"] == "dead_time").unwrap();
    assert_eq!(td["unit"], "min");
}

/// Errors inside a session are JSON events on stdout; the session continues.
#[rstest]
fn jsonl_error_events() {
    let mut cmd = Command::cargo_bin("tuner_cli").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .write_stdin("calc\nlambda 5\nnonsense\nreset\n");

    let out = cmd.assert().success().get_output().stdout.clone();
    let ev = events(&out);
    let reasons: Vec<&str> = ev
        .iter()
        .filter(|v| v["event"] == "error")
        .map(|v| v["reason"].as_str().unwrap())
        .collect();
    assert_eq!(reasons, ["State", "State", "Usage"]);
    for e in ev.iter().filter(|v| v["event"] == "error") {
        assert!(e["message"].as_str().unwrap().starts_with("What happened:"));
        assert!(e["error"].is_string());
    }
    assert_eq!(ev.last().unwrap()["event"], "reset");
}

/// Fatal startup errors are a single JSON object and a non-zero exit.
#[rstest]
fn jsonl_fatal_error() {
    let mut cmd = Command::cargo_bin("tuner_cli").unwrap();
    cmd.arg("--json")
        .arg("tune")
        .arg("--data")
        .arg("/no/such/file.csv")
        .write_stdin("");

    let out = cmd.assert().code(3).get_output().stdout.clone();
    let ev = events(&out);
    assert_eq!(ev.len(), 1);
    assert_eq!(ev[0]["event"], "error");
    assert_eq!(ev[0]["reason"], "Open");
}

#[rstest]
fn jsonl_check_config() {
    let mut cmd = Command::cargo_bin("tuner_cli").unwrap();
    cmd.arg("--json").arg("check-config");

    let out = cmd.assert().success().get_output().stdout.clone();
    let ev = events(&out);
    assert_eq!(ev.len(), 1);
    let settings = &ev[0]["settings"];
    assert_eq!(settings["display"]["slope_decimals"], 4);
    assert_eq!(settings["display"]["show"].as_array().unwrap().len(), 9);
    assert_eq!(settings["lambda"]["min_dead_time_multiple"], 3.0);
    assert!(ev[0]["source"].is_null());
}
