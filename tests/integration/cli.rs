use pprb::test_utils::TestTree;
use predicates::prelude::*;
use std::fs;

use crate::common::pprb_command;

#[test]
fn test_render_to_stdout() {
    let tree = TestTree::new().unwrap();
    tree.write("page.txt", "hello\n%for i = 1, 2\nline `i`\n-\n").unwrap();

    pprb_command(tree.root())
        .args(["render", "page.txt"])
        .assert()
        .success()
        .stdout("hello\nline 1\nline 2\n")
        .stderr("");
}

#[test]
fn test_render_to_file() {
    let tree = TestTree::new().unwrap();
    tree.write("page.txt", "`6 * 7`\n").unwrap();

    pprb_command(tree.root())
        .args(["render", "page.txt", "-o", "out.txt"])
        .assert()
        .success()
        .stdout("");

    assert_eq!(fs::read_to_string(tree.path("out.txt")).unwrap(), "42\n");
}

#[test]
fn test_render_from_stdin() {
    let tree = TestTree::new().unwrap();

    pprb_command(tree.root())
        .args(["render", "-"])
        .write_stdin("sum: `1+1`\n")
        .assert()
        .success()
        .stdout("sum: 2\n");
}

#[test]
fn test_render_from_stdin_with_virtual_path() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "profile('comment_embedded')\n").unwrap();

    pprb_command(tree.root())
        .args(["render", "-", "--stdin-path", "main.c"])
        .write_stdin("// %if true\nint x;\n// -\n")
        .assert()
        .success()
        .stdout("int x;\n");
}

/// Diagnostics go to stderr in the fixed layout; partial output is kept
#[test]
fn test_render_with_diagnostic() {
    let tree = TestTree::new().unwrap();
    let page = tree.write("page.txt", "kept\n>error('boom')\nlost\n").unwrap();

    pprb_command(tree.root())
        .args(["render", "page.txt"])
        .assert()
        .failure()
        .code(1)
        .stdout("kept\n")
        .stderr(predicate::str::starts_with(format!("{}:2: error: boom\n\nBacktrace:\n", page.display())))
        .stderr(predicate::str::contains("Working directory: "));
}

#[test]
fn test_render_fatal_error() {
    let tree = TestTree::new().unwrap();
    tree.write("page.txt", "text\n-\n").unwrap();

    pprb_command(tree.root())
        .args(["render", "page.txt"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Unexpected block end (no matching block start)"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_render_missing_input() {
    let tree = TestTree::new().unwrap();

    pprb_command(tree.root())
        .args(["render", "absent.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read absent.txt"));
}

#[test]
fn test_render_rules_flags() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "who = 'default'\n").unwrap();
    tree.write("other.rules", "who = 'other'\n").unwrap();
    tree.write("page.txt", "`who`\n").unwrap();

    pprb_command(tree.root()).args(["render", "page.txt"]).assert().success().stdout("default\n");

    pprb_command(tree.root())
        .args(["render", "page.txt", "--rules", "other.rules"])
        .assert()
        .success()
        .stdout("other\n");

    pprb_command(tree.root())
        .args(["render", "page.txt", "--no-rules"])
        .assert()
        .success()
        .stdout("nil\n");
}

#[test]
fn test_compile_prints_program() {
    let tree = TestTree::new().unwrap();
    tree.write("page.txt", "%if ok\nyes\n-\n").unwrap();

    pprb_command(tree.root())
        .args(["compile", "page.txt"])
        .assert()
        .success()
        .stdout("if ok then\n__out(\"yes\\\n\"); end\n");
}

#[test]
fn test_compile_in_code_mode() {
    let tree = TestTree::new().unwrap();
    tree.write("module.pprb.i", "x = 1\n>x is `x`\n").unwrap();

    pprb_command(tree.root())
        .args(["compile", "--code", "module.pprb.i"])
        .assert()
        .success()
        .stdout("x = 1\n__out(\"x is \") __out((x)) __out(\"\\\n\")\n");
}

#[test]
fn test_profiles_lists_builtins() {
    let tree = TestTree::new().unwrap();

    pprb_command(tree.root())
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("default"))
        .stdout(predicate::str::contains("comment_embedded"))
        .stdout(predicate::str::contains("block_start"))
        .stdout(predicate::str::contains("^//\\s*%(.*)"));
}

#[test]
fn test_profiles_unknown_name_suggests() {
    let tree = TestTree::new().unwrap();

    pprb_command(tree.root())
        .args(["profiles", "defualt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown profile: 'defualt'"))
        .stderr(predicate::str::contains("Did you mean 'default'?"));
}

#[test]
fn test_config_flag() {
    let tree = TestTree::new().unwrap();
    tree.write("settings.toml", "profile = \"comment_embedded\"\n").unwrap();
    tree.write("main.c", "// %if true\nint x;\n// -\n").unwrap();

    pprb_command(tree.root())
        .args(["--config", "settings.toml", "render", "main.c"])
        .assert()
        .success()
        .stdout("int x;\n");
}

#[test]
fn test_invalid_settings_file() {
    let tree = TestTree::new().unwrap();
    tree.write("settings.toml", "unknown_key = 1\n").unwrap();
    tree.write("page.txt", "text\n").unwrap();

    pprb_command(tree.root())
        .args(["render", "page.txt", "-c", "settings.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid settings file"));
}
