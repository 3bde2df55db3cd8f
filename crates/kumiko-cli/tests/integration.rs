//! Integration tests for kumiko-cli.
//!
//! Tests drive the built `kumiko` binary: object listing, a console session
//! fed through stdin, and rendering a saved patch to disk.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Helper to get the path to the `kumiko` binary built by cargo.
fn kumiko_bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_kumiko"));
    command.env("RUST_LOG", "warn");
    command
}

fn console(script: &str, extra: &[&str]) -> Output {
    let mut child = kumiko_bin()
        .arg("console")
        .arg("--quiet")
        .args(extra)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run kumiko console");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("failed to write script");
    child.wait_with_output().expect("console did not exit")
}

fn save_tone_patch(path: &Path) {
    let script = format!(
        "create sig~ 0.5\ncreate dac~ 1 2\nconnect 0 0 1 0\nconnect 0 0 1 1\nsave {}\n",
        path.display()
    );
    let output = console(&script, &[]);
    assert!(output.status.success());
    assert!(path.exists(), "console did not save {}", path.display());
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `kumiko objects`
// ---------------------------------------------------------------------------

#[test]
fn cli_objects_lists_builtins() {
    let output = kumiko_bin()
        .arg("objects")
        .output()
        .expect("failed to run kumiko objects");
    assert!(output.status.success(), "kumiko objects failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Objects"));
    for name in ["+", "print", "send", "receive", "metro", "osc~", "dac~"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn cli_objects_detail_shows_ports() {
    let output = kumiko_bin()
        .args(["objects", "metro 250"])
        .output()
        .expect("failed to run kumiko objects metro");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Inlets:"));
    assert!(stdout.contains("Outlets:"));
    assert!(stdout.contains("interval"));
    assert!(stdout.contains("250.0"));
}

#[test]
fn cli_objects_unknown_object_fails() {
    let output = kumiko_bin()
        .args(["objects", "nonexistent_object_xyz"])
        .output()
        .expect("failed to run kumiko");
    assert!(!output.status.success(), "should fail for unknown object");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown object"),
        "error should mention unknown object, got: {stderr}"
    );
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `kumiko console`
// ---------------------------------------------------------------------------

#[test]
fn cli_console_runs_a_session() {
    let script = "\
create + 1
create print answer
connect 0 0 1 0
send 0 0 41
frobnicate
list
";
    let output = console(script, &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("answer: 42"), "got: {stdout}");
    assert!(stdout.contains("error: unknown command 'frobnicate'"));
    assert!(stdout.contains("0:0 -> 1:0"));
}

#[test]
fn cli_console_reopens_saved_patch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.kumiko");
    save_tone_patch(&path);

    let output = console("list\nquit\ncreate + 1\n", &[path.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0: sig~ 0.5"));
    assert!(stdout.contains("0:0 ~> 1:1"));
    assert!(!stdout.contains("2: +"), "quit should end the session");
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `kumiko render` / `kumiko run`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_writes_wav() {
    let dir = TempDir::new().unwrap();
    let patch = dir.path().join("tone.kumiko");
    let wav = dir.path().join("tone.wav");
    save_tone_patch(&patch);

    let output = kumiko_bin()
        .args(["render", patch.to_str().unwrap(), "-o", wav.to_str().unwrap()])
        .args(["--seconds", "0.01", "--sample-rate", "8000", "--quiet"])
        .output()
        .expect("failed to run kumiko render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (channels, spec) = kumiko_io::read_wav(&wav).unwrap();
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0], vec![0.5; 80]);
    assert_eq!(channels[1], vec![0.5; 80]);
}

#[test]
fn cli_render_missing_patch_fails() {
    let dir = TempDir::new().unwrap();
    let output = kumiko_bin()
        .args(["render", "no_such_patch_xyz", "-o"])
        .arg(dir.path().join("out.wav"))
        .output()
        .expect("failed to run kumiko render");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn cli_run_stops_after_duration() {
    let dir = TempDir::new().unwrap();
    let patch = dir.path().join("tone.kumiko");
    save_tone_patch(&patch);

    let output = kumiko_bin()
        .args(["run", patch.to_str().unwrap(), "--duration", "0.1"])
        .output()
        .expect("failed to run kumiko run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("blocks processed"));
}

#[test]
fn cli_explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    let output = kumiko_bin()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("objects")
        .output()
        .expect("failed to run kumiko");
    assert!(!output.status.success());
}

#[test]
fn cli_help_lists_subcommands() {
    let output = kumiko_bin().arg("--help").output().expect("failed to run kumiko");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["console", "render", "run", "objects", "patches"] {
        assert!(stdout.contains(command), "help should list '{command}'");
    }
}
