mod common;

use common::{audit_events, fresh_runtime, run, run_with_stdin, stdout_json, write_content};
use std::fs;

#[test]
fn register_then_verify_is_intact() {
    let root = fresh_runtime("roundtrip");
    let file = write_content(&root, "report.txt", b"quarterly numbers, final");
    let file_str = file.to_string_lossy().to_string();

    let reg = stdout_json(&run(&root, &["register", "--in", &file_str]));
    assert_eq!(reg["ok"], true);
    assert_eq!(reg["identifier"], "report.txt");
    assert_eq!(reg["digest"].as_str().unwrap().len(), 64);

    let ver = stdout_json(&run(&root, &["verify", "--in", &file_str]));
    assert_eq!(ver["identifier"], "report.txt");
    assert_eq!(ver["verdict"]["integrity_status"], "intact");
    assert_eq!(ver["verdict"]["signature_delta"].as_f64(), Some(0.0));
    assert_eq!(ver["verdict"]["digest_matches"], true);
    assert!(ver.get("comparison").is_none());

    let stored: serde_json::Value =
        serde_json::from_slice(&fs::read(root.join("fingerprints.json")).unwrap()).unwrap();
    assert_eq!(stored["report.txt"]["digest"], reg["digest"]);

    let events = audit_events(&root);
    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|e| e.get("event_type").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(kinds, vec!["content_registered", "content_verified"]);
    assert_eq!(events[1]["tolerance_threshold"].as_f64(), Some(0.0001));
}

#[test]
fn modified_content_fails_digest_check() {
    let root = fresh_runtime("tamper");
    let file = write_content(&root, "contract.txt", b"pay 100 to alice");
    let file_str = file.to_string_lossy().to_string();
    stdout_json(&run(&root, &["register", "--in", &file_str]));

    fs::write(&file, b"pay 900 to alice").unwrap();
    let ver = stdout_json(&run(&root, &["verify", "--in", &file_str, "--comparison"]));
    assert_eq!(ver["verdict"]["digest_matches"], false);

    assert_eq!(ver["verdict"]["integrity_status"], "tampered");
    let delta = ver["verdict"]["signature_delta"].as_f64().unwrap();
    assert!((delta - 0.004897).abs() < 1e-9, "{}", delta);

    let cmp = &ver["comparison"];
    assert_eq!(cmp["current_amplitudes"].as_array().unwrap().len(), 16);
    assert_eq!(cmp["historic_amplitudes_approx"].as_array().unwrap().len(), 16);
    assert!(cmp["original_signature"].is_f64());
}

#[test]
fn unknown_identifier_is_rejected() {
    let root = fresh_runtime("unknown");
    let file = write_content(&root, "never.txt", b"never registered");
    let out = run(&root, &["verify", "--in", &file.to_string_lossy()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("record_not_found"), "{}", stderr);
    assert!(out.stdout.is_empty());

    let events = audit_events(&root);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "verification_rejected");
    assert_eq!(events[0]["reason"], "record_not_found");
    assert_eq!(events[0]["identifier"], "never.txt");
}

#[test]
fn reregistration_overwrites_previous_record() {
    let root = fresh_runtime("overwrite");
    let file = write_content(&root, "notes.md", b"draft one");
    let file_str = file.to_string_lossy().to_string();
    stdout_json(&run(&root, &["register", "--in", &file_str]));
    fs::write(&file, b"draft two, with more words").unwrap();
    stdout_json(&run(&root, &["register", "--in", &file_str]));

    let ver = stdout_json(&run(&root, &["verify", "--in", &file_str]));
    assert_eq!(ver["verdict"]["integrity_status"], "intact");
    assert_eq!(ver["verdict"]["digest_matches"], true);

    let list = stdout_json(&run(&root, &["list"]));
    assert_eq!(list["identifiers"], serde_json::json!(["notes.md"]));
}

#[test]
fn explicit_identifier_and_show() {
    let root = fresh_runtime("show");
    let file = write_content(&root, "a.bin", &[1, 2, 3, 4]);
    let file_str = file.to_string_lossy().to_string();
    let reg = stdout_json(&run(&root, &["register", "--id", "alpha", "--in", &file_str]));

    let shown = stdout_json(&run(&root, &["show", "--id", "alpha"]));
    assert_eq!(shown["signature"], reg["signature"]);
    assert_eq!(shown["digest"], reg["digest"]);

    let missing = run(&root, &["show", "--id", "beta"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("record_not_found"));
}

#[test]
fn stdin_signature_matches_registered_file() {
    let root = fresh_runtime("stdin");
    let bytes = b"streamed content".to_vec();
    let file = write_content(&root, "s.txt", &bytes);
    let reg = stdout_json(&run(&root, &["register", "--in", &file.to_string_lossy()]));

    let sig = stdout_json(&run_with_stdin(&["signature", "--stdin"], &bytes));
    assert_eq!(sig["length"], 16);
    assert_eq!(sig["signature"], reg["signature"]);
    assert_eq!(sig["digest"], reg["digest"]);
}

#[test]
fn empty_file_is_a_defined_degenerate_case() {
    let root = fresh_runtime("empty");
    let file = write_content(&root, "empty.bin", b"");
    let file_str = file.to_string_lossy().to_string();
    let reg = stdout_json(&run(&root, &["register", "--in", &file_str]));
    assert_eq!(reg["signature"].as_f64(), Some(0.0));
    assert_eq!(
        reg["digest"],
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    let ver = stdout_json(&run(&root, &["verify", "--in", &file_str]));
    assert_eq!(ver["verdict"]["integrity_status"], "intact");
}
