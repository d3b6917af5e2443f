//! PPRB - a line-oriented text preprocessor with embedded Lua
//!
//! PPRB lets literal text and Lua code interleave line by line. Each input
//! is compiled into a single Lua program that writes the literal text
//! through an output function; running that program produces the rendered
//! text.
//!
//! # Directive Syntax
//!
//! With the `default` profile:
//!
//! ```text
//! %for i = 1, 3        block start: Lua opening a scope
//! item `i`             literal text with an inline expression
//! -                    block end
//! >total = 3           line escape: one line of the other mode
//! %lua                 block start switching to raw code
//! local x = 1
//! -
//! ```
//!
//! The `comment_embedded` profile puts the same markers behind `//`, so an
//! input can stay valid C, C++ or JavaScript source:
//!
//! ```text
//! // %if DEBUG
//! log_everything();
//! // -
//! ```
//!
//! # Rules and Modules
//!
//! Before an input is compiled, every `pprb.rules` file between the
//! filesystem root and the input's directory is executed, outermost first.
//! Rules pick the profile for the inputs below them:
//!
//! ```lua
//! profile("comment_embedded")
//! profile_for("*.foo", { blockStart = "^@@(.*)" })
//! ```
//!
//! `use("name")` compiles and runs every `name.pprb.i` module found on the
//! same search path. Modules start in code mode.
//!
//! # Core Modules
//!
//! - [`engine`] - Compilation and the [`Preprocessor`] API
//! - [`profile`] - Pattern tables and built-in profiles
//! - [`runtime`] - Lua execution, script bindings and diagnostics
//! - [`search_path`] - Directory chain for rules and modules
//! - [`pattern`] - Glob filters for `profile_for`
//! - [`config`] - User settings
//! - [`core`] - Error types and user-facing error reporting
//! - [`cli`] - The `pprb` command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use pprb::{Source, render};
//!
//! # fn example() -> Result<(), pprb::core::PreprocessError> {
//! let source = Source::from_text("hello\n%if true\nworld `1+1`\n-\n");
//! assert_eq!(render(&source, None)?, "hello\nworld 2\n");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod engine;
pub mod pattern;
pub mod profile;
pub mod runtime;
pub mod search_path;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use engine::{CompileOptions, Preprocessor, Source, compile, render};
pub use runtime::Diagnostic;
