use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("battery-box-sim-{}-{name}", std::process::id()))
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_battery-box-sim"))
        .args(args)
        .output()
        .expect("battery-box-sim process should run")
}

#[test]
fn preset_run_prints_summary_and_writes_outputs() {
    let csv = scratch_path("rows.csv");
    let json = scratch_path("summary.json");
    let output = run_cli(&[
        "--preset",
        "baseline",
        "--out",
        csv.to_str().expect("utf8 path"),
        "--summary-out",
        json.to_str().expect("utf8 path"),
    ]);

    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("Run Summary"));

    let rows = fs::read_to_string(&csv).expect("csv written");
    // 1 header + one day of minutes
    assert_eq!(rows.lines().count(), 1 + 24 * 60);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).expect("json written")).expect("valid JSON");
    assert_eq!(summary["steps"], 24 * 60);

    let _ = fs::remove_file(csv);
    let _ = fs::remove_file(json);
}

#[test]
fn scenario_files_run() {
    for path in ["scenarios/baseline.toml", "scenarios/no_heater.toml"] {
        let output = run_cli(&["--scenario", path]);
        assert!(
            output.status.success(),
            "scenario run failed for {path}: stderr={}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn no_heater_scenario_reports_no_activations() {
    let json = scratch_path("no-heater.json");
    let output = run_cli(&[
        "--scenario",
        "scenarios/no_heater.toml",
        "--summary-out",
        json.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success());
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).expect("json written")).expect("valid JSON");
    assert_eq!(summary["heater_activations"], 0);
    assert_eq!(summary["heater_energy_j"], 0.0);
    let _ = fs::remove_file(json);
}

#[test]
fn unknown_preset_exits_with_error() {
    let output = run_cli(&["--preset", "tropical"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "stderr={stderr}");
}

#[test]
fn invalid_scenario_reports_field() {
    let path = scratch_path("bad.toml");
    fs::write(&path, "[battery]\nmass_kg = -1.0\n").expect("write scenario");
    let output = run_cli(&["--scenario", path.to_str().expect("utf8 path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("battery.mass_kg"), "stderr={stderr}");
    let _ = fs::remove_file(path);
}
