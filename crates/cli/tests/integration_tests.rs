//! Integration tests that spawn the actual `cli` binary and drive it over
//! stdin/stdout, covering both engine families the binary can select.
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run_cli_command(engine: &str, data_dir: &Path, command: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new("cargo")
        .args(["run", "-p", "cli", "--"])
        .env("KV_ENGINE", engine)
        .env("KV_DATA_DIR", data_dir.to_str().unwrap())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cli");

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        stdin.write_all(command.as_bytes()).expect("failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("failed to write EXIT");
    }

    let output = child.wait_with_output().expect("failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn bitcask_basic_set_get() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path()).unwrap();

    let output = run_cli_command("bitcask", dir.path(), "SET key1 value1\nGET key1\n");

    assert!(output.contains("OK"));
    assert!(output.contains("value1"));
}

#[test]
fn lsm_basic_set_get() {
    let dir = tempdir().unwrap();

    let output = run_cli_command("lsm", dir.path(), "SET key1 value1\nGET key1\n");

    assert!(output.contains("OK"));
    assert!(output.contains("value1"));
}

#[test]
fn delete_then_get_reports_nil() {
    let dir = tempdir().unwrap();
    let commands = "SET a 1\nDEL a\nGET a\n";
    let output = run_cli_command("bitcask", dir.path(), commands);

    assert!(output.contains("(nil)"));
}

#[test]
fn scan_reports_every_key_in_range() {
    let dir = tempdir().unwrap();
    let commands = "SET a 1\nSET b 2\nSET c 3\nSCAN a b\n";
    let output = run_cli_command("lsm", dir.path(), commands);

    assert!(output.contains("a -> 1"));
    assert!(output.contains("b -> 2"));
    assert!(!output.contains("c -> 3"));
}

#[test]
fn compact_reports_reclaimed_bytes() {
    let dir = tempdir().unwrap();
    let commands = "SET a 1\nSET a 2\nCOMPACT\n";
    let output = run_cli_command("bitcask", dir.path(), commands);

    assert!(output.contains("reclaimed"));
}

#[test]
fn state_survives_a_restart() {
    let dir = tempdir().unwrap();
    run_cli_command("bitcask", dir.path(), "SET a 1\n");
    let output = run_cli_command("bitcask", dir.path(), "GET a\n");

    assert!(output.contains('1'));
}
