/// Startup behaviour of the compiled service binary.
///
/// Run with: cargo test --test startup -- --nocapture

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_service(dir: &TempDir, model_path: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reward_predictor"))
        .current_dir(dir.path())
        .env_remove("REWARD_CONFIG")
        .env("MODEL_PATH", model_path)
        .env("HOST", "127.0.0.1")
        .env("PORT", "0")
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to spawn service binary")
}

#[test]
fn test_missing_artifact_fails_startup() {
    println!("\n=== Test: Missing artifact ===");
    let dir = TempDir::new().unwrap();
    let out = run_service(&dir, "no-such-model.json");
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    println!("stderr: {stderr}");

    assert!(!out.status.success());
    assert!(stderr.contains("model artifact not found"));
    assert!(stderr.contains("no-such-model.json"));
    assert!(!stdout.contains("listening on"));
}

#[test]
fn test_corrupt_artifact_fails_startup() {
    println!("\n=== Test: Corrupt artifact ===");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, "{\"version\": 1, \"columns\": [").unwrap();

    let out = run_service(&dir, path.to_str().unwrap());
    let stderr = String::from_utf8_lossy(&out.stderr);
    println!("stderr: {stderr}");

    assert!(!out.status.success());
    assert!(stderr.contains("corrupt or incompatible"));
}

#[test]
fn test_bad_port_fails_startup() {
    let dir = TempDir::new().unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_reward_predictor"))
        .current_dir(dir.path())
        .env_remove("REWARD_CONFIG")
        .env("PORT", "not-a-port")
        .output()
        .expect("failed to spawn service binary");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("PORT"));
}
