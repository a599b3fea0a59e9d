//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `apex` binary and verify exit codes,
//! stdout content, and stderr content. Every test runs inside its own
//! temporary directory so no stray `apex.toml` is picked up.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const FOO: &str = "\
public class Foo extends Base implements Runnable {
    private Integer count;
    public String label { get; set; }
    public Foo(Integer start) { count = start; }
    public void bar() { }
    public class Inner { }
}
";

const BROKEN: &str = "\
public class Foo {
    public void bar() {
        Integer x = 1
        Integer y = 2;
    }
}
";

/// Helper: create a Command for the `apex` binary, rooted at `dir`.
fn apex(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("apex");
    cmd.current_dir(dir.path());
    cmd.env_remove("APEX_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = TempDir::new().unwrap();
    apex(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Apex language front end"));
}

#[test]
fn version_exits_0() {
    let dir = TempDir::new().unwrap();
    apex(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("apex"));
}

// ──────────────────────────────────────────────
// 2. Parse subcommand
// ──────────────────────────────────────────────

#[test]
fn parse_valid_file_prints_symbols() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Foo.cls", FOO);
    apex(&dir)
        .args(["parse", "Foo.cls"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "public class Foo extends Base implements Runnable",
        ))
        .stdout(predicate::str::contains("field count: Integer"))
        .stdout(predicate::str::contains("property label: String"))
        .stdout(predicate::str::contains("constructor Foo(Integer)"))
        .stdout(predicate::str::contains("method bar(): void"))
        .stdout(predicate::str::contains("  public class Inner"));
}

#[test]
fn parse_json_output_is_a_parse_result() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Foo.cls", FOO);
    let output = apex(&dir)
        .args(["parse", "Foo.cls", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["symbol_table"]["name"], "Foo");
    assert_eq!(value["accepted"], true);
    assert_eq!(value["diagnostics"].as_array().map(Vec::len), Some(0));
}

#[test]
fn parse_with_syntax_error_exits_1() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Broken.cls", BROKEN);
    apex(&dir)
        .args(["parse", "Broken.cls"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Broken.cls:4:9: syntax error"));
}

#[test]
fn parse_missing_file_exits_1() {
    let dir = TempDir::new().unwrap();
    apex(&dir)
        .args(["parse", "Nope.cls"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading file"));
}

// ──────────────────────────────────────────────
// 3. Tokens subcommand
// ──────────────────────────────────────────────

#[test]
fn tokens_lists_kinds_and_text() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Foo.cls", "class Foo { }");
    apex(&dir)
        .args(["tokens", "Foo.cls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1:7\tIdentifier\t\"Foo\""))
        .stdout(predicate::str::contains("Whitespace").not());
}

#[test]
fn tokens_with_trivia_include_whitespace() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Foo.cls", "class Foo { } // done");
    apex(&dir)
        .args(["tokens", "Foo.cls", "--trivia"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Whitespace"))
        .stdout(predicate::str::contains("LineComment"));
}

// ──────────────────────────────────────────────
// 4. Symbols subcommand
// ──────────────────────────────────────────────

#[test]
fn symbols_finds_builtin_types() {
    let dir = TempDir::new().unwrap();
    apex(&dir)
        .args(["symbols", "String"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global class System.String"))
        .stdout(predicate::str::contains("method valueOf(Object): String"));
}

#[test]
fn symbols_unknown_type_exits_1() {
    let dir = TempDir::new().unwrap();
    apex(&dir)
        .args(["symbols", "NoSuchType"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("type 'NoSuchType' not found"));
}

#[test]
fn no_builtins_flag_hides_platform_types() {
    let dir = TempDir::new().unwrap();
    apex(&dir)
        .args(["symbols", "String", "--no-builtins"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn parsed_tables_persist_to_the_symbols_folder() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Foo.cls", FOO);
    apex(&dir)
        .args(["parse", "Foo.cls", "--symbols-folder", "syms"])
        .assert()
        .success();
    assert!(dir.path().join("syms").join("foo.json").exists());

    apex(&dir)
        .args(["symbols", "foo", "--symbols-folder", "syms", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Foo\""));
}

#[test]
fn apex_toml_configures_the_symbols_folder() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Foo.cls", FOO);
    write(
        &dir,
        "apex.toml",
        "[symbols]\nfolder = \".apex\"\nbuiltins = false\n",
    );
    apex(&dir).args(["parse", "Foo.cls"]).assert().success();
    assert!(dir.path().join(".apex").join("foo.json").exists());

    apex(&dir)
        .args(["symbols", "Foo.Inner"])
        .assert()
        .success()
        .stdout(predicate::str::contains("public class Inner"));
    apex(&dir).args(["symbols", "String"]).assert().failure();
}

#[test]
fn invalid_config_exits_1() {
    let dir = TempDir::new().unwrap();
    write(&dir, "apex.toml", "[symbols]\nbuiltins = \"yes\"\n");
    apex(&dir)
        .args(["symbols", "String"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid config"));
}
