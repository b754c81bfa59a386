use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const EXE: &str = env!("CARGO_BIN_EXE_squid_log_analyzer");

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(EXE)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run failed")
}

fn scenario_log() -> String {
    let denied = "1286536309.586 921 1.2.3.4 [date] TCP_DENIED/403 GET /secret";
    let hit = "1286536310.001 12 5.6.7.8 [date] TCP_HIT/200 GET /index";
    [denied, denied, denied, hit, hit, "too few tokens"].join("\n")
}

#[test]
fn end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("access.log"), scenario_log()).unwrap();

    let output = run_in(dir.path(), &["access.log"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TOP 10 IPs BY FAILED ATTEMPTS"));
    assert!(stdout.contains("1.2.3.4"));
    assert!(stdout.find("/secret").unwrap() < stdout.find("/index").unwrap());
    assert!(stdout.contains("Results saved to 'resultado.csv'"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("skipping malformed line").count(), 1);
    assert!(stderr.contains("line=6"));

    let csv = fs::read_to_string(dir.path().join("resultado.csv")).unwrap();
    assert_eq!(
        csv,
        "IP,Tentativas Falhas\n1.2.3.4,3\n\nURL,Acessos\n/secret,3\n/index,2\n"
    );
}

#[test]
fn top_n_argument_limits_console_output_only() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("access.log"), scenario_log()).unwrap();

    let output = run_in(dir.path(), &["access.log", "1"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TOP 1 MOST ACCESSED URLs"));
    assert!(!stdout.contains("/index"));

    let csv = fs::read_to_string(dir.path().join("resultado.csv")).unwrap();
    assert!(csv.contains("/index,2"));
}

#[test]
fn quiet_suppresses_line_warnings() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("access.log"), scenario_log()).unwrap();

    let output = run_in(dir.path(), &["--quiet", "access.log"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("skipping malformed line"));
}

#[test]
fn missing_argument_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(!dir.path().join("resultado.csv").exists());
}

#[test]
fn non_numeric_top_n_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("access.log"), scenario_log()).unwrap();

    for bad in ["ten", "-3"] {
        let output = run_in(dir.path(), &["access.log", bad]);
        assert_eq!(output.status.code(), Some(1), "accepted top_n {bad}");
    }
    assert!(!dir.path().join("resultado.csv").exists());
}

#[test]
fn nonexistent_log_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["does-not-exist.log"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.log"));
    assert!(!dir.path().join("resultado.csv").exists());
}

#[test]
fn unwritable_csv_is_reported_but_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("access.log"), scenario_log()).unwrap();
    // occupy the output name with a directory
    fs::create_dir(dir.path().join("resultado.csv")).unwrap();

    let output = run_in(dir.path(), &["access.log"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1.2.3.4"));
    assert!(stdout.contains("failed to save CSV"));
}
