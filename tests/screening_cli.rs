use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_screening_cli"))
}

fn run_json(args: &[&str]) -> (Option<i32>, Value) {
    let output = cli().args(args).output().expect("run command");
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    let json = serde_json::from_str(&stdout)
        .unwrap_or_else(|err| panic!("invalid JSON ({err}): {stdout}"));
    (output.status.code(), json)
}

#[test]
fn classify_high_frequency_loss() {
    let (code, report) = run_json(&["classify", "--failed", "4000,8000"]);
    assert_eq!(code, Some(0));
    assert_eq!(report["pattern_id"], "high-frequency-loss");
    assert_eq!(report["urgency"], "routine");
    assert_eq!(report["referral_needed"], true);
}

#[test]
fn classify_from_detected_list() {
    let (_, report) = run_json(&["classify", "--detected", "1000,2000,3000,4000,8000"]);
    assert_eq!(report["pattern_id"], "low-frequency-loss");
    assert_eq!(report["speech_intelligibility"]["percentage"], 85);
}

#[test]
fn classify_requires_one_list() {
    let output = cli().args(["classify"]).output().expect("run command");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn gain_without_calibration_is_base() {
    let (code, gain) = run_json(&["gain", "--frequency", "1000"]);
    assert_eq!(code, Some(0));
    assert_eq!(gain["linear_gain"].as_f64(), Some(0.1));
}

#[test]
fn gain_stacks_layers() {
    let (_, gain) = run_json(&[
        "gain",
        "--frequency",
        "2000",
        "--headphone",
        "sony-wh1000xm4",
        "--platform",
        "android",
        "--bio",
        "2000=-2",
    ]);
    assert_eq!(gain["headphone_db"].as_f64(), Some(-1.5));
    assert_eq!(gain["device_db"].as_f64(), Some(-1.0));
    assert_eq!(gain["biological_db"].as_f64(), Some(-2.0));

    let expected = 0.1 * 10f64.powf(-4.5 / 20.0);
    let actual = gain["linear_gain"].as_f64().unwrap();
    assert!((actual - expected).abs() < 1e-9);
}

#[test]
fn gain_rejects_unknown_headphone() {
    let output = cli()
        .args(["gain", "--frequency", "1000", "--headphone", "koss-porta-pro"])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn profiles_lists_tables() {
    let (_, profiles) = run_json(&["profiles"]);
    assert_eq!(profiles["headphones"].as_array().unwrap().len(), 8);
    assert_eq!(profiles["devices"].as_array().unwrap().len(), 4);
}

#[test]
fn acuity_replays_responses() {
    let (_, outcome) = run_json(&["acuity", "--age", "10", "--responses", "1,0,1,0,1,1,1"]);
    assert_eq!(outcome["trials_completed"], 5);
    assert_eq!(outcome["reversals"], 4);
    assert_eq!(outcome["complete"], true);
    assert_eq!(outcome["ignored_responses"], 2);
    // Fewer than six trials: current level (index 2) is reported
    assert_eq!(outcome["logmar"].as_f64(), Some(0.2));
    assert_eq!(outcome["snellen_equivalent"], "20/32");
}

#[test]
fn noise_exit_code_reflects_environment() {
    let (quiet_code, quiet) = run_json(&["noise", "--levels", "30,32,35"]);
    assert_eq!(quiet_code, Some(0));
    assert_eq!(quiet["acceptable"], true);

    let (loud_code, loud) = run_json(&["noise", "--levels", "30,52"]);
    assert_eq!(loud_code, Some(2));
    assert_eq!(loud["acceptable"], false);
}

#[test]
fn hearing_simulation_reports_audiogram() {
    let (_, outcome) = run_json(&["hearing", "--miss", "1000,2000"]);
    assert_eq!(outcome["pass"], false);
    assert_eq!(outcome["audiogram_report"]["pattern_id"], "cookie-bite");

    let (_, standard) = run_json(&["hearing", "--set", "standard"]);
    assert_eq!(standard["pass"], true);
    assert!(standard["audiogram_report"].is_null());
}

#[test]
fn calibration_select_persists_between_runs() {
    let store = std::env::temp_dir().join(format!(
        "screening-cli-calibration-{}.json",
        std::process::id()
    ));
    let store_arg = store.to_str().unwrap();

    let (code, summary) = run_json(&[
        "calibration",
        "--store",
        store_arg,
        "select",
        "apple-airpods",
    ]);
    assert_eq!(code, Some(0));
    assert_eq!(summary["calibrated"], true);

    let (_, snapshot) = run_json(&["calibration", "--store", store_arg, "export"]);
    assert_eq!(snapshot["version"], "1.0");
    assert_eq!(snapshot["headphone"], "apple-airpods");

    let (_, reset) = run_json(&["calibration", "--store", store_arg, "reset"]);
    assert_eq!(reset["calibrated"], false);
    assert!(!store.exists());
}
