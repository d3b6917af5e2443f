//! Common test utilities for PPRB integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use pprb::{CompileOptions, Diagnostic, Preprocessor, Source};
use std::path::Path;

/// `pprb` binary running in `dir`, isolated from the user's settings.
pub fn pprb_command(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pprb").unwrap();
    cmd.current_dir(dir)
        .env("PPRB_CONFIG", dir.join(".no-such-pprb-config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// Render without echoing diagnostics, returning output and diagnostics.
pub fn render_collecting(source: &Source) -> (String, Vec<Diagnostic>) {
    let preprocessor =
        Preprocessor::compile_with(source, CompileOptions::new().silent()).unwrap();
    let output = preprocessor.run().unwrap();
    (output, preprocessor.diagnostics())
}

/// Render text with no location.
pub fn render_text(text: &str) -> String {
    let (output, diagnostics) = render_collecting(&Source::from_text(text));
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    output
}
