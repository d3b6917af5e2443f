use pprb::test_utils::TestTree;

use crate::common::render_collecting;

/// Output before the failure is kept; nothing after it runs
#[test]
fn test_runtime_error_keeps_partial_output() {
    let tree = TestTree::new().unwrap();
    let page = tree.write("page.txt", "first\nsecond\n>error('stop here')\nthird\n").unwrap();

    let (output, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    assert_eq!(output, "first\nsecond\n");
    assert_eq!(diagnostics.len(), 1);

    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.file, page.display().to_string());
    assert_eq!(diagnostic.line, 3);
    assert_eq!(diagnostic.message, "stop here");
    assert_eq!(diagnostic.headline(), format!("{}:3: error: stop here", page.display()));
}

#[test]
fn test_diagnostic_text_layout() {
    let tree = TestTree::new().unwrap();
    let page = tree.write("page.txt", "%if missing_function()\n-\n").unwrap();

    let (_, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    let text = diagnostics[0].to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with(&format!("{}:1: error: ", page.display())));
    assert!(lines[0].contains("missing_function"));
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "Backtrace:");
    assert!(lines.iter().any(|line| line.starts_with(&format!("{}:1: in ", page.display()))));
    assert!(lines.last().unwrap().starts_with("Working directory: "));
}

/// Errors inside functions are located at the failing line, with the
/// call site further down the backtrace
#[test]
fn test_error_inside_function_defined_in_input() {
    let tree = TestTree::new().unwrap();
    let page = tree.write("page.txt", "%function fail()\n>error('inner')\n-\n>fail()\n").unwrap();

    let (_, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    let diagnostic = &diagnostics[0];

    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.message, "inner");
    let call_site = format!("{}:4: in main chunk", page.display());
    assert!(
        diagnostic.backtrace.contains(&call_site),
        "backtrace {:?} lacks {call_site}",
        diagnostic.backtrace
    );
}

/// Syntax errors are located too, and nothing of the input runs
#[test]
fn test_syntax_error_is_located() {
    let tree = TestTree::new().unwrap();
    tree.write("page.txt", "fine\nalso fine\n>x = = 1\n").unwrap();

    let (output, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    assert_eq!(output, "");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 3);
}

/// Runaway recursion is reported like any other failure, with the
/// backtrace cut down to both ends of the stack
#[test]
fn test_runaway_recursion_is_reported_briefly() {
    let tree = TestTree::new().unwrap();
    let page = tree.write("page.txt", "%function f(n)\n>f(n + 1)\n-\n>f(1)\nafter\n").unwrap();

    let (output, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    assert_eq!(output, "");
    assert_eq!(diagnostics.len(), 1);

    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.file, page.display().to_string());
    assert_eq!(diagnostic.line, 2);
    assert!(diagnostic.message.contains("stack overflow"), "{}", diagnostic.message);
    assert!(diagnostic.backtrace.len() <= 22, "{} frames", diagnostic.backtrace.len());
    assert!(diagnostic.backtrace.iter().any(|line| line.starts_with("... (skipping ")));
}

#[test]
fn test_error_in_inline_expression() {
    let tree = TestTree::new().unwrap();
    tree.write("page.txt", "ok\nvalue: `nil + 1`\n").unwrap();

    let (output, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    assert_eq!(output, "ok\nvalue: ");
    assert_eq!(diagnostics[0].line, 2);
    assert!(diagnostics[0].message.contains("arithmetic"));
}

/// A failing rules file does not stop later boundaries from reporting
#[test]
fn test_each_boundary_reports_its_own_failure() {
    let tree = TestTree::new().unwrap();
    let rules = tree.write("pprb.rules", "error('in rules')\n").unwrap();
    let page = tree.write("page.txt", "text\n>error('in page')\n").unwrap();

    let (output, diagnostics) = render_collecting(&tree.source("page.txt").unwrap());
    assert_eq!(output, "text\n");
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].file, rules.display().to_string());
    assert_eq!(diagnostics[0].message, "in rules");
    assert_eq!(diagnostics[1].file, page.display().to_string());
    assert_eq!(diagnostics[1].message, "in page");
}
