#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/vmodem-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn vmodem() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vmodem"));
    command.arg("--log-level").arg("error");
    command
}

#[test]
fn parse_capture_prints_json_lines() {
    let dir = unique_temp_dir("parse");
    let capture = dir.join("session.bin");
    std::fs::write(
        &capture,
        b"\r\n+CPIN: READY\r\nOK\r\n+CREG: 1,\"00C3\",\"0000001A\",7\r\nRING\r\n",
    )
    .expect("capture should be writable");

    let output = vmodem()
        .arg("--format")
        .arg("json")
        .arg("parse")
        .arg(&capture)
        .output()
        .expect("parse should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let kinds: Vec<String> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value =
                serde_json::from_str(line).expect("every line should be JSON");
            value["kind"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(kinds, vec!["CPIN", "OK", "CREG", "RING"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parse_with_line_feeds_reads_text_replies() {
    let dir = unique_temp_dir("parse-lf");
    let capture = dir.join("session.txt");
    std::fs::write(&capture, "310260000000001\nOK\n+CFUN: 0\n").expect("capture should be writable");

    let output = vmodem()
        .arg("--format")
        .arg("raw")
        .arg("parse")
        .arg("--lf")
        .arg(&capture)
        .output()
        .expect("parse should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["string", "CFUN"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unparseable_capture_returns_60() {
    let dir = unique_temp_dir("parse-bad");
    let capture = dir.join("garbage.bin");
    std::fs::write(&capture, b"OK\r+NOPE: 1\r").expect("capture should be writable");

    let output = vmodem()
        .arg("--format")
        .arg("json")
        .arg("parse")
        .arg(&capture)
        .output()
        .expect("parse should run");

    assert_eq!(output.status.code(), Some(60));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"kind\":\"OK\""));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unparseable"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parse_missing_file_fails() {
    let output = vmodem()
        .arg("parse")
        .arg("/nonexistent/vmodem/capture.bin")
        .output()
        .expect("parse should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed reading"));
}

#[test]
fn version_prints_name() {
    let output = vmodem().arg("version").output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("vmodem "));

    let output = vmodem()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: vmodem"));
    assert!(stdout.contains("response_kinds: 47"));
}
