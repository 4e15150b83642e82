use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::error::Error;

#[test]
fn smooth_replicates_edges() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["smooth", "--length", "3"])
        .write_stdin("10\n20\n30\n40\n50\n");
    let output = cmd.assert().success().get_output().stdout.clone();
    let values: Vec<f64> = serde_json::from_slice(&output)?;
    assert_eq!(values, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    Ok(())
}

#[test]
fn smooth_removes_spike() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["smooth", "--length", "3"])
        .write_stdin("72\n73\n190\n74\n72\n");
    let output = cmd.assert().success().get_output().stdout.clone();
    let values: Vec<f64> = serde_json::from_slice(&output)?;
    assert_eq!(values, vec![72.0, 73.0, 74.0, 74.0, 72.0]);
    Ok(())
}

#[test]
fn smooth_rejects_even_length() {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["smooth", "--length", "4"]).write_stdin("1\n2\n");
    cmd.assert().failure();
}

#[test]
fn synth_then_detect_finds_beats() -> Result<(), Box<dyn Error>> {
    let mut synth = cargo_bin_cmd!("tachy");
    synth.args(["synth", "--fs", "250", "--segment", "8:75"]);
    let samples = synth.assert().success().get_output().stdout.clone();
    assert_eq!(String::from_utf8(samples.clone())?.lines().count(), 2000);

    let mut detect = cargo_bin_cmd!("tachy");
    detect
        .args(["detect", "--fs", "250", "--min-rr-s", "0.3"])
        .write_stdin(samples);
    let output = detect.assert().success().get_output().stdout.clone();
    let events: Value = serde_json::from_slice(&output)?;
    let indices = events["indices"].as_array().expect("indices");
    assert!(
        (9..=11).contains(&indices.len()),
        "unexpected beat count {}",
        indices.len()
    );
    Ok(())
}

#[test]
fn synth_requires_segment() {
    let mut cmd = cargo_bin_cmd!("tachy");
    cmd.args(["synth", "--fs", "250"]);
    cmd.assert().failure();
}

#[test]
fn synth_rejects_non_finite_input() {
    let mut rate = cargo_bin_cmd!("tachy");
    rate.args(["synth", "--fs", "250", "--segment", "10:inf"]);
    rate.assert().failure();

    let mut noise = cargo_bin_cmd!("tachy");
    noise.args(["synth", "--fs", "250", "--segment", "2:60", "--noise", "inf"]);
    noise.assert().failure();
}

#[test]
fn synth_is_reproducible() -> Result<(), Box<dyn Error>> {
    let run = || -> Result<Vec<u8>, Box<dyn Error>> {
        let mut cmd = cargo_bin_cmd!("tachy");
        cmd.args([
            "synth", "--fs", "100", "--segment", "3:60", "--noise", "0.05", "--seed", "11",
        ]);
        Ok(cmd.assert().success().get_output().stdout.clone())
    };
    assert_eq!(run()?, run()?);
    Ok(())
}
