use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ofdmsim"))
}

fn run_ofdmsim(args: &[&str]) -> (bool, String) {
    let (ok, stdout, stderr) = run_ofdmsim_split(args);
    (ok, stderr + &stdout)
}

/// Keeps stdout apart so JSON output can be parsed without log lines mixed in
fn run_ofdmsim_split(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(binary())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute ofdmsim");

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn create_config(name: &str, content: &str) -> PathBuf {
    let tmp_dir = std::env::temp_dir().join("ofdmsim-cli-tests");
    fs::create_dir_all(&tmp_dir).expect("Failed to create temp dir");
    let path = tmp_dir.join(name);
    fs::write(&path, content).expect("Failed to write config file");
    path
}

#[test]
fn test_simulate_summary() {
    let (ok, text) = run_ofdmsim(&["simulate", "--seed", "1", "--channel", "awgn", "--snr", "30"]);
    assert!(ok, "simulate failed: {}", text);
    assert!(text.contains("BER:"), "Missing BER line: {}", text);
    assert!(text.contains("QPSK"), "Missing modulation: {}", text);
}

#[test]
fn test_simulate_json() {
    let (ok, text, stderr) = run_ofdmsim_split(&[
        "simulate", "--seed", "3", "-n", "64", "-m", "16QAM", "--json",
    ]);
    assert!(ok, "simulate --json failed: {}", stderr);

    let value: serde_json::Value = serde_json::from_str(&text).expect("Output is not JSON");
    assert_eq!(value["freq_signal"].as_array().map(|a| a.len()), Some(64));
    assert_eq!(value["transmitted_bits"].as_array().map(|a| a.len()), Some(56 * 4));
    assert_eq!(value["subcarrier_map"].as_array().map(|a| a.len()), Some(64));
    assert_eq!(value["constellation"].as_array().map(|a| a.len()), Some(16));
}

#[test]
fn test_simulate_is_reproducible() {
    let args = ["simulate", "--seed", "42", "--random-channel", "--json"];
    let (ok_a, a, _) = run_ofdmsim_split(&args);
    let (ok_b, b, _) = run_ofdmsim_split(&args);
    assert!(ok_a && ok_b);
    assert_eq!(a, b);
}

#[test]
fn test_simulate_rejects_bad_subcarriers() {
    let (ok, text) = run_ofdmsim(&["simulate", "-n", "100"]);
    assert!(!ok, "Expected failure for 100 subcarriers");
    assert!(text.contains("power of two"), "Unexpected error: {}", text);
}

#[test]
fn test_simulate_with_config_file() {
    let config = create_config(
        "polar.json",
        r#"{
            "parameters": { "num_subcarriers": 256, "interpolation": "polar", "snr_db": 25 },
            "multipath": { "paths": [ { "delay": 0, "gain": 1.0, "phase": 0 } ] }
        }"#,
    );
    let (ok, text) = run_ofdmsim(&[
        "simulate",
        "--config",
        config.to_str().unwrap(),
        "--seed",
        "5",
    ]);
    assert!(ok, "simulate with config failed: {}", text);
    assert!(text.contains("Subcarriers:     256"), "Config not applied: {}", text);
    assert!(text.contains("polar"), "Config not applied: {}", text);
}

#[test]
fn test_sweep_json() {
    let (ok, text, stderr) = run_ofdmsim_split(&[
        "sweep", "--seed", "9", "--channel", "awgn", "--snr-start", "0", "--snr-stop", "20",
        "--snr-step", "10", "--trials", "3", "--json",
    ]);
    assert!(ok, "sweep failed: {}", stderr);

    let value: serde_json::Value = serde_json::from_str(&text).expect("Output is not JSON");
    let points = value.as_array().expect("Expected an array");
    assert_eq!(points.len(), 3);
    assert_eq!(points[2]["snr_db"], serde_json::json!(20.0));
}

#[test]
fn test_channel_command() {
    let (ok, text) = run_ofdmsim(&["channel", "--seed", "7", "--num-paths", "4", "--points", "8"]);
    assert!(ok, "channel failed: {}", text);
    assert!(text.contains("Total power: 1.000000"), "Unexpected output: {}", text);
    assert!(text.contains("|H|"));
}
