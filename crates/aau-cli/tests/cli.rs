#![allow(missing_docs)]

use std::process::Command;

use tempfile::TempDir;

fn aau(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_aau"));
    let _ = cmd
        .env("HOME", home.path())
        .env_remove("CONDA_PREFIX")
        .env_remove("AAU_ANON_USAGE")
        .env_remove("AAU_DEBUG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn random_prints_a_token_and_exits_zero() {
    let home = TempDir::new().unwrap();
    let output = aau(&home).arg("random").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let token = stdout.trim_end();
    assert_eq!(token.len(), 22);
    assert!(
        token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn tokens_are_stable_across_invocations() {
    let home = TempDir::new().unwrap();
    let client = |stdout: &[u8]| {
        String::from_utf8(stdout.to_vec())
            .unwrap()
            .split(' ')
            .find(|p| p.starts_with("c/"))
            .map(str::to_string)
    };
    let first = aau(&home).arg("tokens").output().unwrap();
    let second = aau(&home).arg("tokens").output().unwrap();
    assert!(first.status.success());
    assert!(client(&first.stdout).is_some());
    assert_eq!(client(&first.stdout), client(&second.stdout));
    assert!(home.path().join(".conda").join("aau_token").exists());
}

#[test]
fn disabled_by_environment_prints_host_agent_only() {
    let home = TempDir::new().unwrap();
    let output = aau(&home)
        .args(["tokens", "--host-agent", "conda/24.1"])
        .env("AAU_ANON_USAGE", "false")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "conda/24.1\n");
    assert!(!home.path().join(".conda").join("aau_token").exists());
}
