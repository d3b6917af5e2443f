//! PPRB command-line entry point.
//!
//! - `render` - Compile and run an input
//! - `compile` - Print the generated Lua program
//! - `profiles` - List built-in profiles
//!
//! See the [`pprb::cli`] module for details.

use clap::Parser;
use pprb::cli;
use pprb::core::user_friendly_error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(code) => code,
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            ExitCode::FAILURE
        }
    }
}
