//! Print the generated Lua program.
//!
//! Rules are loaded exactly as for `render`, because the profile they pick
//! decides how the input is classified. The program is not run.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use super::common::{SourceArgs, write_output};
use crate::config::Settings;
use crate::engine::Preprocessor;

/// Command to show the program generated for an input.
#[derive(Args, Debug)]
pub struct CompileCommand {
    #[command(flatten)]
    source: SourceArgs,
}

impl CompileCommand {
    /// Execute the compile command.
    pub fn execute(self, settings: Settings) -> Result<ExitCode> {
        let source = self.source.source()?;
        let preprocessor = Preprocessor::compile_with(&source, self.source.options(settings))?;

        let mut program = preprocessor.program().text().to_string();
        if !program.ends_with('\n') {
            program.push('\n');
        }
        write_output(None, &program)?;

        if preprocessor.diagnostics().is_empty() {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }
}
