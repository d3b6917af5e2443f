//! The preprocessing engine.
//!
//! Rendering is two-phase. Compilation classifies every input line against
//! the active pattern table and generates one Lua program from it; running
//! executes that program, whose `__out` calls fill the output buffer.
//!
//! ```text
//! input ──► classifier ──► mode stack ──► generator ──► Program
//!                                                         │
//!               rules files ──► Lua state ◄──────────────┘
//!                                  │
//!                                  ▼
//!                               output
//! ```
//!
//! Rules files found on the search path run before compilation, so the
//! profile they select governs how the input is classified.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pprb::engine::{Preprocessor, Source, render};
//!
//! # fn example() -> Result<(), pprb::core::PreprocessError> {
//! let output = render(&Source::from_text("result: `1+1`\n"), None)?;
//! assert_eq!(output, "result: 2\n");
//!
//! let preprocessor = Preprocessor::compile(&Source::from_file("page.html.pp")?)?;
//! println!("{}", preprocessor.program().text());
//! let output = preprocessor.run()?;
//! # Ok(())
//! # }
//! ```

mod classifier;
mod compiler;
mod generator;
mod mode;

pub use classifier::{Directive, classify};
pub use compiler::compile_program;
pub use generator::{CodeGenerator, Program, escape_text};
pub use mode::{Mode, ModeStack};

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

use crate::config::Settings;
use crate::constants::ANONYMOUS_SOURCE;
use crate::core::PreprocessError;
use crate::profile::PatternTable;
use crate::runtime::{Diagnostic, Runtime, Session};
use crate::search_path::SearchPath;

/// Input text and, when it came from a file, its absolute path.
///
/// The path determines the search path and what `profile_for` filters see.
/// Text is UTF-8: input files in other encodings are rejected when read,
/// and bytes written by scripts that are not UTF-8 are replaced with
/// U+FFFD in the rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    text: String,
    path: Option<PathBuf>,
}

impl Source {
    /// A source with no location: no rules load and `use` always fails.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: None,
        }
    }

    /// Read a source file.
    ///
    /// # Errors
    ///
    /// [`PreprocessError::Io`] when the file cannot be read or is not valid
    /// UTF-8.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PreprocessError> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|e| PreprocessError::io(path, &e))?;
        let text = fs::read_to_string(&absolute).map_err(|e| PreprocessError::io(path, &e))?;
        Ok(Self {
            text,
            path: Some(absolute),
        })
    }

    /// Attribute the text to `path`, as if it had been read from there.
    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.path = Some(std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| ANONYMOUS_SOURCE.to_string(), |path| path.display().to_string())
    }
}

/// Knobs of a single compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    start_mode: Mode,
    rules_file: Option<String>,
    load_rules: bool,
    settings: Settings,
    echo_diagnostics: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            start_mode: Mode::Template,
            rules_file: None,
            load_rules: true,
            settings: Settings::default(),
            echo_diagnostics: true,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode the input starts in.
    #[must_use]
    pub fn with_start_mode(mut self, mode: Mode) -> Self {
        self.start_mode = mode;
        self
    }

    /// Rules file name; `None` keeps the one from the settings.
    #[must_use]
    pub fn with_rules_file(mut self, rules_file: Option<&str>) -> Self {
        self.rules_file = rules_file.map(str::to_string);
        self
    }

    /// Skip rules loading entirely.
    #[must_use]
    pub fn without_rules(mut self) -> Self {
        self.load_rules = false;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Collect diagnostics without writing them to stderr.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.echo_diagnostics = false;
        self
    }

    fn rules_file(&self) -> &str {
        self.rules_file.as_deref().unwrap_or(&self.settings.rules_file)
    }
}

/// A compiled input, ready to run.
///
/// Owns the Lua state the rules ran in; running the program continues in
/// that same state.
pub struct Preprocessor {
    runtime: Runtime,
    program: Rc<Program>,
    search_path: SearchPath,
    origin: String,
}

impl Preprocessor {
    /// Compile with default options.
    ///
    /// # Errors
    ///
    /// See [`Preprocessor::compile_with`].
    pub fn compile(source: &Source) -> Result<Self, PreprocessError> {
        Self::compile_with(source, CompileOptions::default())
    }

    /// Load rules, then compile `source` under the resulting pattern table.
    ///
    /// # Errors
    ///
    /// Any fatal error: configuration errors raised by rules, an unmatched
    /// block end, a missing module used by rules, an unreadable rules file,
    /// or a failure that could not be located. Evaluation errors in rules
    /// files are reported as diagnostics instead.
    pub fn compile_with(source: &Source, options: CompileOptions) -> Result<Self, PreprocessError> {
        let origin = source.display_name();
        let search_path = match source.path() {
            Some(path) => SearchPath::for_input(path, &options.settings.modules_dir),
            None => SearchPath::empty(),
        };
        let patterns = PatternTable::new(options.settings.initial_profile()?);

        let runtime = Runtime::new(Session::new(
            patterns,
            search_path.clone(),
            source.path().map(Path::to_path_buf),
            options.settings.clone(),
            options.echo_diagnostics,
        ))?;

        if options.load_rules {
            runtime.load_rules(options.rules_file())?;
        }

        let program = {
            let patterns = runtime.session().patterns.borrow();
            compile_program(source.text(), options.start_mode, &patterns, &origin)?
        };
        debug!("Compiled {} ({} bytes of Lua)", origin, program.text().len());

        Ok(Self {
            runtime,
            program: Rc::new(program),
            search_path,
            origin,
        })
    }

    /// The generated program.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Execute the program and return the rendered output.
    ///
    /// An evaluation error stops execution; it is reported as a diagnostic
    /// and the output produced before it is returned.
    ///
    /// # Errors
    ///
    /// Fatal errors raised while running, such as an unknown profile or a
    /// missing module.
    pub fn run(&self) -> Result<String, PreprocessError> {
        self.runtime.run(Rc::clone(&self.program), &self.origin)?;
        let output = self.output();
        info!("Rendered {} ({} bytes)", self.origin, output.len());
        Ok(output)
    }

    /// Output produced so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.runtime.session().output()
    }

    /// Diagnostics reported by rules, modules and the program.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.runtime.session().diagnostics()
    }

    #[must_use]
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Snapshot of the active pattern table.
    #[must_use]
    pub fn patterns(&self) -> PatternTable {
        self.runtime.session().patterns.borrow().clone()
    }

    /// Name of the compiled input in diagnostics.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Compile and run `source` in one step.
///
/// `rules_file` overrides the rules file name from the settings.
///
/// # Errors
///
/// Any fatal error from compiling or running. Evaluation errors are
/// written to stderr and the partial output is returned.
pub fn render(source: &Source, rules_file: Option<&str>) -> Result<String, PreprocessError> {
    let options = CompileOptions::default().with_rules_file(rules_file);
    Preprocessor::compile_with(source, options)?.run()
}

/// Compile `source` with default options.
///
/// # Errors
///
/// See [`Preprocessor::compile_with`].
pub fn compile(source: &Source) -> Result<Preprocessor, PreprocessError> {
    Preprocessor::compile(source)
}
