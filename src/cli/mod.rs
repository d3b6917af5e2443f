//! Command-line interface for PPRB.
//!
//! # Commands
//!
//! - `render` - Compile and run an input, writing the rendered text
//! - `compile` - Print the Lua program generated for an input
//! - `profiles` - List the built-in profiles and their patterns
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging on stderr
//! - `--quiet` / `-q` - Errors only
//! - `--config` / `-c` - Settings file to use instead of `~/.pprb/config.toml`
//!
//! Without `--verbose` or `--quiet`, `RUST_LOG` selects the log filter and
//! defaults to `warn`. Logs and diagnostics go to stderr; stdout carries
//! only rendered output, so the binary can sit in a pipeline:
//!
//! ```bash
//! pprb render page.html.pp > page.html
//! cat config.h.pp | pprb render - --stdin-path include/config.h.pp
//! pprb compile page.html.pp | less
//! ```
//!
//! # Exit Status
//!
//! `render` exits with 1 when any diagnostic was reported, even though the
//! partial output was still written. Fatal errors print a colored error
//! with a suggestion and also exit with 1.

mod common;
mod compile;
mod profiles;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Runtime configuration derived from global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,
    /// Explicit settings file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the stderr log subscriber.
    ///
    /// Safe to call more than once; later calls are ignored.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load settings from the configured path, `$PPRB_CONFIG`, or the
    /// default location.
    ///
    /// # Errors
    ///
    /// Fails when the settings file exists but is invalid.
    pub fn load_settings(&self) -> Result<Settings> {
        Ok(Settings::load_with_optional(self.config_path.clone())?)
    }
}

/// Main CLI structure for PPRB
#[derive(Parser)]
#[command(
    name = "pprb",
    about = "Line-oriented text preprocessor with embedded Lua",
    version,
    long_about = "PPRB interleaves literal text with Lua code using a minimal line-directive \
                  syntax, then runs the generated program to produce the rendered text."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file to use
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run an input, writing the rendered text
    Render(render::RenderCommand),

    /// Print the Lua program generated for an input
    Compile(compile::CompileCommand),

    /// List built-in profiles and their patterns
    Profiles(profiles::ProfilesCommand),
}

impl Cli {
    /// Execute the selected command.
    ///
    /// # Errors
    ///
    /// Returns the fatal error of the command; recoverable failures are
    /// expressed through the exit code instead.
    pub fn execute(self) -> Result<ExitCode> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(&config)
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute the selected command with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`Cli::execute`].
    pub fn execute_with_config(self, config: &CliConfig) -> Result<ExitCode> {
        match self.command {
            Commands::Render(cmd) => cmd.execute(config.load_settings()?),
            Commands::Compile(cmd) => cmd.execute(config.load_settings()?),
            Commands::Profiles(cmd) => cmd.execute(),
        }
    }
}
