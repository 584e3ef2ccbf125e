use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const SAMPLE: &str = r#"4 3
<tag1 value = "HelloWorld">
<tag2 name = "Name1">
</tag2>
</tag1>
tag1.tag2~name
tag1~name
tag1~value
"#;

fn tagquery() -> Command {
    let mut cmd = Command::cargo_bin("tagquery").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_stdin() {
    tagquery()
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout("Name1\nNot Found!\nHelloWorld\n");
}

#[test]
fn test_dash_reads_stdin() {
    tagquery()
        .arg("-")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout("Name1\nNot Found!\nHelloWorld\n");
}

#[test]
fn test_file_input() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    tagquery()
        .arg(file.path())
        .assert()
        .success()
        .stdout("Name1\nNot Found!\nHelloWorld\n");
}

#[test]
fn test_silent_queries() {
    let input = "1 5\n<a value=\"0\"><b value=\"1\"></b></a>\na~value\na.b~value\na.c~value\na\n\n";
    tagquery()
        .write_stdin(input)
        .assert()
        .success()
        .stdout("0\n1\nNot Found!\n");
}

#[test]
fn test_trace_keeps_stdout_clean() {
    tagquery()
        .arg("--trace")
        .env("RUST_LOG", "debug")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout("Name1\nNot Found!\nHelloWorld\n");
}

#[test]
fn test_unparseable_markup() {
    tagquery()
        .write_stdin("1 1\nno tags here\na~b\n")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Could not parse markup"));
}

#[test]
fn test_bad_header() {
    tagquery()
        .write_stdin("three 1\n<a></a>\na\n")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Invalid header line"));
}

#[test]
fn test_truncated_input() {
    tagquery()
        .write_stdin("3 1\n<a></a>\n")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Expected 3 markup lines, found 1"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    tagquery()
        .arg(dir.path().join("missing.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_extra_arguments() {
    tagquery()
        .args(["one.txt", "two.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("usage"));
}
