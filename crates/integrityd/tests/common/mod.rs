#![allow(dead_code)] // Shared across integration test crates; each uses only a subset.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use uuid::Uuid;

pub fn integrityd_exe() -> PathBuf {
    if let Ok(v) = std::env::var("CARGO_BIN_EXE_integrityd") {
        return PathBuf::from(v);
    }
    PathBuf::from(env!("CARGO_BIN_EXE_integrityd"))
}

pub fn fresh_runtime(tag: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("qsig_{}_{}", tag, Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create runtime root");
    root
}

pub fn write_content(root: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let dir = root.join("content");
    fs::create_dir_all(&dir).expect("create content dir");
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write content");
    path
}

pub fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(integrityd_exe())
        .args(args)
        .arg("--runtime")
        .arg(root)
        .output()
        .expect("failed to run integrityd")
}

pub fn run_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(integrityd_exe())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn integrityd");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin)
        .expect("write stdin");
    child.wait_with_output().expect("wait integrityd")
}

pub fn stdout_json(out: &Output) -> serde_json::Value {
    assert!(
        out.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout not json")
}

pub fn audit_events(root: &Path) -> Vec<serde_json::Value> {
    let path = root.join("logs").join("audit.jsonl");
    let contents = fs::read_to_string(path).expect("failed to read audit log");
    let mut events = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: serde_json::Value =
            serde_json::from_str(line).unwrap_or_else(|e| panic!("line {}: {}", i + 1, e));
        let inner = record
            .get("event")
            .and_then(|envelope| envelope.get("event"))
            .unwrap_or_else(|| panic!("line {} missing inner event", i + 1));
        events.push(inner.clone());
    }
    events
}
