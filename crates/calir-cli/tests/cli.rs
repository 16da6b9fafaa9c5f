//! End-to-end checks against the built `calir` binary, in the same
//! `assert_cmd` + `tempfile` shape `faxt`'s integration tests use to drive
//! a CLI through real files instead of calling its internals directly.

use std::io::Write;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::NamedTempFile;

const ADD_MODULE: &str = r#"
module = "m"

define i32 @add(%a: i32, %b: i32) {
$entry:
    %sum: i32 = add %a: i32, %b: i32
    ret %sum: i32
}

define i32 @answer() {
$entry:
    ret 42: i32
}
"#;

const BROKEN_MODULE: &str = r#"
module = "m"

define i32 @bad(%a: i32) {
$entry:
    ret %a: i32
    %dead: i32 = add %a: i32, %a: i32
}
"#;

fn write_fixture(src: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".cal").unwrap();
    file.write_all(src.as_bytes()).unwrap();
    file
}

#[test]
fn emit_ir_prints_the_canonical_reserialization() {
    let fixture = write_fixture(ADD_MODULE);
    Command::cargo_bin("calir")
        .unwrap()
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(contains("define i32 @add"));
}

#[test]
fn emit_verify_reports_ok_for_a_well_formed_module() {
    let fixture = write_fixture(ADD_MODULE);
    Command::cargo_bin("calir")
        .unwrap()
        .args(["--emit", "verify"])
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(contains("ok"));
}

#[test]
fn emit_verify_fails_on_an_instruction_after_a_terminator() {
    let fixture = write_fixture(BROKEN_MODULE);
    Command::cargo_bin("calir")
        .unwrap()
        .args(["--emit", "verify"])
        .arg(fixture.path())
        .assert()
        .failure();
}

#[test]
fn emit_run_interprets_the_entry_function_and_prints_its_result() {
    let fixture = write_fixture(ADD_MODULE);
    Command::cargo_bin("calir")
        .unwrap()
        .args(["--emit", "run", "--entry", "answer"])
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(contains("42"));
}

#[test]
fn emit_run_without_entry_fails() {
    let fixture = write_fixture(ADD_MODULE);
    Command::cargo_bin("calir")
        .unwrap()
        .args(["--emit", "run"])
        .arg(fixture.path())
        .assert()
        .failure();
}

#[test]
fn missing_input_file_fails_with_a_readable_error() {
    Command::cargo_bin("calir")
        .unwrap()
        .arg("/nonexistent/path/module.cal")
        .assert()
        .failure();
}
