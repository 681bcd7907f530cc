//! Process-level checks of the external CLI contract: a script that runs
//! clean exits 0, a compile error exits 65, a runtime error exits 70, and
//! invoking with more than one argument exits 64 with a usage message.

use std::io::Write;

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp script");
    file.write_all(source.as_bytes()).expect("write temp script");
    file
}

#[test]
fn clean_script_exits_zero() {
    let file = script(r#"print 1 + 1;"#);
    Command::cargo_bin("braid").unwrap().arg(file.path()).assert().success().stdout("2\n");
}

#[test]
fn compile_error_exits_65() {
    let file = script("var a = ;");
    Command::cargo_bin("braid").unwrap().arg(file.path()).assert().code(65);
}

#[test]
fn runtime_error_exits_70() {
    let file = script(r#"print 1 + "a";"#);
    Command::cargo_bin("braid").unwrap().arg(file.path()).assert().code(70);
}

#[test]
fn too_many_arguments_exits_64_with_usage() {
    Command::cargo_bin("braid")
        .unwrap()
        .arg("one.braid")
        .arg("two.braid")
        .assert()
        .code(64)
        .stderr("Usage: braid [script]\n");
}
