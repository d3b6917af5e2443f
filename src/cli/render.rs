//! Render an input.
//!
//! Diagnostics are written to stderr as they are reported. The partial
//! output is still written, and the exit status tells the caller that the
//! render was incomplete.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use super::common::{SourceArgs, write_output};
use crate::config::Settings;
use crate::engine::Preprocessor;

/// Command to compile and run an input.
#[derive(Args, Debug)]
pub struct RenderCommand {
    #[command(flatten)]
    source: SourceArgs,

    /// Write the rendered text here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl RenderCommand {
    /// Execute the render command.
    pub fn execute(self, settings: Settings) -> Result<ExitCode> {
        let source = self.source.source()?;
        let preprocessor = Preprocessor::compile_with(&source, self.source.options(settings))?;
        let rendered = preprocessor.run()?;
        write_output(self.output.as_deref(), &rendered)?;

        let diagnostics = preprocessor.diagnostics();
        if diagnostics.is_empty() {
            Ok(ExitCode::SUCCESS)
        } else {
            debug!("{} diagnostic(s) reported for {}", diagnostics.len(), preprocessor.origin());
            Ok(ExitCode::FAILURE)
        }
    }
}
