//! Arguments and I/O shared by the commands that read an input.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::engine::{CompileOptions, Mode, Source};

/// Where the input comes from and how to compile it.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Input file, or `-` to read standard input
    pub input: PathBuf,

    /// Rules file name to look up along the search path
    #[arg(long, value_name = "NAME")]
    pub rules: Option<String>,

    /// Do not load any rules files
    #[arg(long, conflicts_with = "rules")]
    pub no_rules: bool,

    /// Start in code mode instead of template mode
    #[arg(long)]
    pub code: bool,

    /// Treat standard input as if it had been read from this path
    #[arg(long, value_name = "PATH")]
    pub stdin_path: Option<PathBuf>,
}

impl SourceArgs {
    /// Read the input.
    pub fn source(&self) -> Result<Source> {
        if self.input.as_os_str() == "-" {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Failed to read standard input")?;
            let source = Source::from_text(text);
            return Ok(match &self.stdin_path {
                Some(path) => source.with_path(path),
                None => source,
            });
        }
        Ok(Source::from_file(&self.input)?)
    }

    /// Compile options for these arguments on top of `settings`.
    #[must_use]
    pub fn options(&self, settings: Settings) -> CompileOptions {
        let mode = if self.code {
            Mode::Code
        } else {
            Mode::Template
        };
        let options = CompileOptions::new()
            .with_settings(settings)
            .with_start_mode(mode)
            .with_rules_file(self.rules.as_deref());

        if self.no_rules {
            options.without_rules()
        } else {
            options
        }
    }
}

/// Write `text` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("Failed to write output to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")
        }
    }
}
