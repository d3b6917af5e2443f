use pprb::core::PreprocessError;
use pprb::test_utils::TestTree;
use pprb::{CompileOptions, Preprocessor, render};

use crate::common::render_collecting;

/// Rules from every directory run, outermost first, so inner values win
#[test]
fn test_inner_rules_override_outer_rules() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "greeting = 'outer'\nprofile({ blockStart = '^@@(.*)' })\n").unwrap();
    tree.write("site/pprb.rules", "greeting = 'inner'\nprofile({ blockStart = '^!!(.*)' })\n")
        .unwrap();
    tree.write("site/page.txt", "`greeting`\n!!if true\nyes\n-\n@@x\n").unwrap();

    let output = render(&tree.source("site/page.txt").unwrap(), None).unwrap();
    assert_eq!(output, "inner\nyes\n@@x\n");
}

#[test]
fn test_outer_rules_apply_when_inner_is_silent() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "profile('comment_embedded')\n").unwrap();
    tree.write("site/pprb.rules", "answer = 42\n").unwrap();
    tree.write("site/main.c", "// %if answer == 42\nint x = lua_answer_;\n// -\n").unwrap();

    let output = render(&tree.source("site/main.c").unwrap(), None).unwrap();
    assert_eq!(output, "int x = 42;\n");
}

/// A glob-filtered overlay only affects inputs matching the glob
#[test]
fn test_profile_for_glob_filter() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "profile_for('*.foo', { blockStart = '^@@(.*)' })\n").unwrap();
    tree.write("a.foo", "@@if true\nfoo\n-\n%not a directive here\n").unwrap();
    tree.write("b.txt", "@@stays\n%if true\nbar\n-\n").unwrap();

    let foo = render(&tree.source("a.foo").unwrap(), None).unwrap();
    assert_eq!(foo, "foo\n%not a directive here\n");

    let txt = render(&tree.source("b.txt").unwrap(), None).unwrap();
    assert_eq!(txt, "@@stays\nbar\n");
}

#[test]
fn test_profile_for_with_named_profile() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "profile_for('*.c', 'comment_embedded')\n").unwrap();
    tree.write("src/main.c", "// %if true\nint x;\n// -\n").unwrap();

    let output = render(&tree.source("src/main.c").unwrap(), None).unwrap();
    assert_eq!(output, "int x;\n");
}

#[test]
fn test_custom_rules_file_name() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "value = 'default rules'\n").unwrap();
    tree.write("custom.rules", "value = 'custom rules'\n").unwrap();
    tree.write("page.txt", "`value`\n").unwrap();

    let source = tree.source("page.txt").unwrap();
    assert_eq!(render(&source, Some("custom.rules")).unwrap(), "custom rules\n");
    assert_eq!(render(&source, None).unwrap(), "default rules\n");
}

#[test]
fn test_rules_can_be_disabled() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "profile('comment_embedded')\n").unwrap();
    tree.write("page.txt", "%if true\nplain\n-\n").unwrap();

    let options = CompileOptions::new().without_rules().silent();
    let preprocessor =
        Preprocessor::compile_with(&tree.source("page.txt").unwrap(), options).unwrap();
    assert_eq!(preprocessor.run().unwrap(), "plain\n");
}

/// A failing rules file is reported and the remaining rules still run
#[test]
fn test_rules_evaluation_error_is_recoverable() {
    let tree = TestTree::new().unwrap();
    let broken = tree.write("pprb.rules", "first = 1\nerror('broken rules')\n").unwrap();
    tree.write("site/pprb.rules", "second = 2\n").unwrap();
    tree.write("site/page.txt", "`first` `second`\n").unwrap();

    let (output, diagnostics) = render_collecting(&tree.source("site/page.txt").unwrap());
    assert_eq!(output, "1 2\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].file, broken.display().to_string());
    assert_eq!(diagnostics[0].line, 2);
    assert_eq!(diagnostics[0].message, "broken rules");
}

#[test]
fn test_unknown_profile_in_rules_is_fatal() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "profile('comment_embeded')\n").unwrap();
    tree.write("page.txt", "text\n").unwrap();

    let err = render(&tree.source("page.txt").unwrap(), None).unwrap_err();
    match err {
        PreprocessError::UnknownProfile {
            name,
            similar,
        } => {
            assert_eq!(name, "comment_embeded");
            assert_eq!(similar.first().map(String::as_str), Some("comment_embedded"));
        }
        other => panic!("expected UnknownProfile, got {other:?}"),
    }
}

#[test]
fn test_invalid_overlays_are_fatal() {
    let cases = [
        ("profile({ blockBegin = '^%%(.*)' })", "UnknownOption"),
        ("profile({ block_start = 7 })", "InvalidOptionValue"),
        ("profile({ block_start = '(' })", "InvalidOptionValue"),
        ("profile()", "MissingProfileOrOverlay"),
        ("config('default')", "Configuration"),
        ("profile_for('[', 'default')", "InvalidFilter"),
    ];

    for (rules, expected) in cases {
        let tree = TestTree::new().unwrap();
        tree.write("pprb.rules", rules).unwrap();
        tree.write("page.txt", "text\n").unwrap();

        let err = render(&tree.source("page.txt").unwrap(), None).unwrap_err();
        let kind = match err {
            PreprocessError::UnknownOption { .. } => "UnknownOption",
            PreprocessError::InvalidOptionValue { .. } => "InvalidOptionValue",
            PreprocessError::MissingProfileOrOverlay => "MissingProfileOrOverlay",
            PreprocessError::Configuration { .. } => "Configuration",
            PreprocessError::InvalidFilter { .. } => "InvalidFilter",
            other => panic!("{rules}: unexpected {other:?}"),
        };
        assert_eq!(kind, expected, "rules: {rules}");
    }
}

#[test]
fn test_config_overlays_one_pattern() {
    let tree = TestTree::new().unwrap();
    tree.write("pprb.rules", "config({ inlineExpression = '<<(.*?)>>' })\n").unwrap();
    tree.write("page.txt", "sum <<1+2>>, `kept`\n%if true\nin\n-\n").unwrap();

    let output = render(&tree.source("page.txt").unwrap(), None).unwrap();
    assert_eq!(output, "sum 3, `kept`\nin\n");
}
