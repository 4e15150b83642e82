use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::{error::Error, fs};
use tempfile::{tempdir, TempDir};

fn synth(dir: &TempDir, name: &str, segments: &[&str]) -> Result<String, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["synth", "--fs", "250"]);
    for seg in segments {
        cmd.args(["--segment", seg]);
    }
    let output = cmd.assert().success().get_output().stdout.clone();
    let path = dir.path().join(name);
    fs::write(&path, output)?;
    Ok(path.to_string_lossy().to_string())
}

fn report(args: &[&str]) -> Result<Value, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.arg("evaluate").args(args);
    let output = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&output)?)
}

#[test]
fn resting_recording_is_normal() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = synth(&dir, "rest.txt", &["30:75"])?;
    let report = report(&[
        "--input",
        &input,
        "--fs",
        "250",
        "--threshold",
        "150",
        "--min-rr-s",
        "0.3",
    ])?;
    assert_eq!(report["abnormal"], Value::Bool(false));
    assert_eq!(report["sample_count"], 7500);
    let windows = report["windows"].as_array().expect("windows");
    assert_eq!(windows.len(), (7500 - 1280) / 256 + 1);
    let smoothed = report["smoothed"].as_array().expect("smoothed");
    assert_eq!(smoothed.len(), report["timeline"].as_array().unwrap().len());
    Ok(())
}

#[test]
fn verdict_only_prints_boolean() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = synth(&dir, "rest.txt", &["20:75"])?;
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args([
        "evaluate",
        "--input",
        &input,
        "--threshold",
        "50",
        "--min-rr-s",
        "0.3",
        "--verdict-only",
    ]);
    cmd.assert().success().stdout("true\n");
    Ok(())
}

#[test]
fn tachycardia_stretch_is_abnormal() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = synth(&dir, "tachy.txt", &["10:75", "20:170"])?;
    let report = report(&["--input", &input, "--threshold", "140"])?;
    assert_eq!(report["abnormal"], Value::Bool(true));
    Ok(())
}

#[test]
fn missing_threshold_is_rejected() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.arg("evaluate").write_stdin("0.0\n1.0\n0.0\n");
    let assert = cmd.assert().failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone())?;
    assert!(stderr.contains("no threshold"), "{stderr}");
    Ok(())
}

#[test]
fn even_median_length_is_rejected() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["evaluate", "--threshold", "150", "--median-length", "4"])
        .write_stdin("0.0\n1.0\n0.0\n");
    let assert = cmd.assert().failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone())?;
    assert!(stderr.contains("median filter length"), "{stderr}");
    Ok(())
}

fn flat_samples(n: usize) -> String {
    "0.0\n".repeat(n)
}

#[test]
fn beatless_stream_aborts_by_default() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["evaluate", "--fs", "256", "--threshold", "150"])
        .write_stdin(flat_samples(1280));
    let assert = cmd.assert().failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone())?;
    assert!(stderr.contains("produced no beat-interval rates"), "{stderr}");
    Ok(())
}

#[test]
fn beatless_stream_with_skip_reports_gap() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args([
        "evaluate",
        "--fs",
        "256",
        "--threshold",
        "150",
        "--on-empty-window",
        "skip",
    ])
    .write_stdin(flat_samples(1280));
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Value = serde_json::from_slice(&output)?;
    assert_eq!(report["abnormal"], Value::Bool(false));
    assert_eq!(report["gaps"], serde_json::json!([0]));
    assert_eq!(report["windows"][0]["rate_bpm"], Value::Null);
    Ok(())
}

#[test]
fn settings_file_supplies_threshold() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = synth(&dir, "rest.txt", &["20:75"])?;
    let config = dir.path().join("tachy.toml");
    fs::write(
        &config,
        "[input]\nfs = 250.0\n[window]\nsize = 1250\nstep = 250\n[alert]\nthreshold_bpm = 150.0\n[detector]\nmin_rr_s = 0.3\n",
    )?;
    let report = report(&[
        "--input",
        &input,
        "--config",
        config.to_str().expect("utf8 path"),
    ])?;
    assert_eq!(report["fs"], 250.0);
    assert_eq!(report["windows"][1]["start"], 250);
    assert_eq!(report["abnormal"], Value::Bool(false));
    Ok(())
}

#[test]
fn reads_named_csv_column() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let text = synth(&dir, "rest.txt", &["12:75"])?;
    let mut csv = String::from("time,ecg\n");
    for (i, line) in fs::read_to_string(&text)?.lines().enumerate() {
        csv.push_str(&format!("{},{}\n", i as f64 / 250.0, line));
    }
    let path = dir.path().join("rest.csv");
    fs::write(&path, csv)?;
    let report = report(&[
        "--csv",
        path.to_str().expect("utf8 path"),
        "--column",
        "ecg",
        "--fs",
        "250",
        "--threshold",
        "50",
        "--min-rr-s",
        "0.3",
    ])?;
    assert_eq!(report["sample_count"], 3000);
    assert_eq!(report["abnormal"], Value::Bool(true));
    Ok(())
}

#[test]
fn quantumleap_attribute_must_exist() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("entity.json");
    fs::write(
        &path,
        r#"{"entityId": "urn:ngsiv2:Ecg:Patient01", "attributes": [{"attrName": "spo2", "values": [97, 98]}]}"#,
    )?;
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args([
        "evaluate",
        "--quantumleap",
        path.to_str().expect("utf8 path"),
        "--threshold",
        "150",
    ]);
    let assert = cmd.assert().failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone())?;
    assert!(stderr.contains("sample acquisition failed"), "{stderr}");
    assert!(stderr.contains("no attribute 'ecg'"), "{stderr}");
    Ok(())
}

#[test]
fn quantumleap_samples_are_evaluated() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let text = synth(&dir, "rest.txt", &["12:75"])?;
    let values: Vec<f64> = fs::read_to_string(&text)?
        .lines()
        .map(|l| l.parse::<f64>())
        .collect::<Result<_, _>>()?;
    let body = serde_json::json!({
        "entityId": "urn:ngsiv2:Ecg:Patient01",
        "attributes": [{"attrName": "ecg", "values": values}]
    });
    let path = dir.path().join("entity.json");
    fs::write(&path, body.to_string())?;
    let report = report(&[
        "--quantumleap",
        path.to_str().expect("utf8 path"),
        "--fs",
        "250",
        "--threshold",
        "150",
        "--min-rr-s",
        "0.3",
    ])?;
    assert_eq!(report["sample_count"], 3000);
    assert_eq!(report["abnormal"], Value::Bool(false));
    Ok(())
}
