use std::process::Command;

use tempfile::NamedTempFile;

fn run(fixture: &str, extra: &[&str]) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    let output = Command::new(env!("CARGO_BIN_EXE_stock-ledger"))
        .arg(&path)
        .args(extra)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn valid_operations() {
    let (stdout, stderr, success) = run("valid.csv", &[]);

    assert!(success);
    assert!(stderr.is_empty());

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "article,available,owed,reservations",
            "1,3,0,",
            "2,0,3,202:3",
            "3,0,0,",
        ]
    );
}

#[test]
fn events_are_written_in_emission_order() {
    let events = NamedTempFile::new().unwrap();
    let events_path = events.path().to_str().unwrap();

    let (_, _, success) = run("valid.csv", &[events_path]);
    assert!(success);

    let written = std::fs::read_to_string(events.path()).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            "event,article,shipment,amount",
            "supplier_order,1,100,7",
            "supplier_order,2,200,5",
            "supplier_order,2,201,5",
            "shipment_ready,2,200,5",
            "shipment_ready,2,201,2",
            "shipment_ready,1,100,7",
            "supplier_order,2,202,3",
        ]
    );
}

#[test]
fn errors_warn_but_do_not_block() {
    let (stdout, stderr, success) = run("with_errors.csv", &[]);

    assert!(success);
    assert!(stderr.contains("unrecognized operation"));
    assert!(stderr.contains("missing amount"));
    assert!(stderr.contains("missing shipment"));
    assert!(stderr.contains("rejected"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["article,available,owed,reservations", "1,6,0,"]);
}

#[test]
fn missing_input_fails() {
    let (_, stderr, success) = run("does_not_exist.csv", &[]);

    assert!(!success);
    assert!(stderr.contains("failed to open"));
}

#[test]
fn overflowing_amounts_are_rejected_not_fatal() {
    let (stdout, stderr, success) = run("overflow.csv", &[]);

    assert!(success);
    assert!(stderr.contains("would overflow"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "article,available,owed,reservations",
            "1,9223372036854775802,0,",
            "2,0,9223372036854775807,7:9223372036854775807",
        ]
    );
}
