//! Error handling for PPRB
//!
//! This module provides the error taxonomy of the preprocessor and the
//! user-friendly reporting used by the command-line interface. The error
//! system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell fatal failures from
//!    recoverable ones
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Configuration** (fatal): unknown profile, unknown overlay key, overlay
//!   value of the wrong type, invalid glob filter
//! - **Structural** (fatal): a block end without a matching block start
//! - **Module not found** (fatal): `use` of a module absent from the search path
//! - **Evaluation** (recoverable): executed code failed at a known source line
//! - **Unrecoverable** (fatal): executed code failed and no source line could
//!   be attributed to the failure
//!
//! Evaluation errors are caught at every execution boundary (rules file,
//! module, top-level program) and turned into a [`Diagnostic`]. Everything
//! else propagates to the caller unchanged.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pprb::core::{ErrorCategory, PreprocessError};
//!
//! let error = PreprocessError::UnknownProfile {
//!     name: "defualt".to_string(),
//!     similar: vec!["default".to_string()],
//! };
//! assert_eq!(error.category(), ErrorCategory::Configuration);
//! assert!(error.is_fatal());
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::runtime::Diagnostic;

/// The main error type for PPRB operations
///
/// Each variant carries enough context to explain the failure without the
/// surrounding call stack. Use [`PreprocessError::category`] to map a variant
/// onto the error taxonomy.
#[derive(Error, Debug, Clone)]
pub enum PreprocessError {
    /// A named profile does not exist
    #[error("Unknown profile: '{name}'")]
    UnknownProfile {
        /// The requested profile name
        name: String,
        /// Built-in profile names close to the requested one
        similar: Vec<String>,
    },

    /// An overlay used a key outside the pattern table
    #[error("Unknown option: '{key}'")]
    UnknownOption {
        /// The rejected key
        key: String,
        /// Valid keys close to the rejected one
        similar: Vec<String>,
    },

    /// An overlay value is not a usable pattern
    #[error("Invalid value for option '{key}': {reason}")]
    InvalidOptionValue {
        /// The option being set
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A profile call named neither a profile nor an overlay
    #[error("No profile or overlay specified")]
    MissingProfileOrOverlay,

    /// A glob filter could not be compiled
    #[error("Invalid path filter '{pattern}': {reason}")]
    InvalidFilter {
        /// The glob as written
        pattern: String,
        /// The glob parser's complaint
        reason: String,
    },

    /// Any other misuse of the configuration surface
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem
        message: String,
    },

    /// A block end appeared while no block was open
    #[error("{file}:{line}: Unexpected block end (no matching block start)")]
    UnmatchedBlockEnd {
        /// File containing the directive
        file: String,
        /// 1-based line of the directive
        line: usize,
    },

    /// No search-path directory contains the requested module
    #[error("Could not find PPRB module '{name}'")]
    ModuleNotFound {
        /// The module name passed to `use`
        name: String,
        /// The file name that was looked for in every directory
        file_name: String,
        /// Number of directories searched
        searched: usize,
    },

    /// Executed code failed at a known source location
    #[error("{0}")]
    Evaluation(Box<Diagnostic>),

    /// Executed code failed and the failure could not be located
    #[error("Unrecoverable evaluation failure: {message}")]
    Unrecoverable {
        /// The raw failure message
        message: String,
    },

    /// Reading an input, rules or module file failed
    #[error("Failed to read {}: {reason}", path.display())]
    Io {
        /// The file being read
        path: PathBuf,
        /// The underlying I/O error
        reason: String,
    },

    /// The settings file could not be read or parsed
    #[error("Invalid settings file {}: {reason}", path.display())]
    Settings {
        /// The settings file
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },
}

/// Position of an error in the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid profile, overlay or settings
    Configuration,
    /// Block structure of the input is broken
    Structural,
    /// A `use` target does not exist
    ModuleNotFound,
    /// Executed code failed at a known location
    Evaluation,
    /// Executed code failed somewhere unknown
    Unrecoverable,
    /// The filesystem refused a read
    Io,
}

impl PreprocessError {
    /// Map the error onto its taxonomy category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownProfile { .. }
            | Self::UnknownOption { .. }
            | Self::InvalidOptionValue { .. }
            | Self::MissingProfileOrOverlay
            | Self::InvalidFilter { .. }
            | Self::Configuration { .. }
            | Self::Settings { .. } => ErrorCategory::Configuration,
            Self::UnmatchedBlockEnd { .. } => ErrorCategory::Structural,
            Self::ModuleNotFound { .. } => ErrorCategory::ModuleNotFound,
            Self::Evaluation(_) => ErrorCategory::Evaluation,
            Self::Unrecoverable { .. } => ErrorCategory::Unrecoverable,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Whether the error must abort the render.
    ///
    /// Only evaluation errors are recoverable; they are reported as
    /// diagnostics and the render keeps whatever output it produced.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category() != ErrorCategory::Evaluation
    }

    pub(crate) fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: error.to_string(),
        }
    }
}

/// Error context wrapper that adds details and a suggestion to an error
///
/// This is what the CLI prints when a command fails.
///
/// # Examples
///
/// ```rust,no_run
/// use pprb::core::{ErrorContext, PreprocessError};
///
/// let context = ErrorContext::new(PreprocessError::MissingProfileOrOverlay)
///     .with_suggestion("Pass a profile name such as \"default\" or an overlay table")
///     .with_details("profile() needs at least one argument");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PreprocessError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: PreprocessError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`PreprocessError`] anywhere in an [`anyhow`] chain (context
/// wrappers included) and [`std::io::Error`]; anything else is shown with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(preprocess_error) = error.downcast_ref::<PreprocessError>() {
        return create_error_context(preprocess_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let context = ErrorContext::new(PreprocessError::Io {
            path: PathBuf::from("unknown"),
            reason: io_error.to_string(),
        });
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => context
                .with_suggestion("Check that the input file exists and the path is correct"),
            std::io::ErrorKind::PermissionDenied => {
                context.with_suggestion("Check the file permissions of the input and output paths")
            }
            _ => context,
        };
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(PreprocessError::Unrecoverable {
        message,
    })
}

fn create_error_context(error: PreprocessError) -> ErrorContext {
    match &error {
        PreprocessError::UnknownProfile {
            similar,
            ..
        } => {
            let context = ErrorContext::new(error.clone())
                .with_details("Built-in profiles are 'default' and 'comment_embedded'");
            match similar.first() {
                Some(candidate) => context.with_suggestion(format!("Did you mean '{candidate}'?")),
                None => context,
            }
        }
        PreprocessError::UnknownOption {
            similar,
            ..
        } => {
            let context = ErrorContext::new(error.clone()).with_details(
                "Overlay keys are block_start, block_end, line_escape and inline_expression",
            );
            match similar.first() {
                Some(candidate) => context.with_suggestion(format!("Did you mean '{candidate}'?")),
                None => context,
            }
        }
        PreprocessError::InvalidOptionValue {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Overlay values must be strings containing a regular expression"),
        PreprocessError::MissingProfileOrOverlay => ErrorContext::new(error)
            .with_suggestion("Call profile(\"default\"), profile({ ... }) or both"),
        PreprocessError::UnmatchedBlockEnd {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove the stray block end or add the block start it closes"),
        PreprocessError::ModuleNotFound {
            file_name,
            searched,
            ..
        } => {
            let details = format!("Looked for '{file_name}' in {searched} search-path directories");
            ErrorContext::new(error).with_details(details).with_suggestion(
                "Place the module next to the input, in a parent directory, or in a pprb_modules directory",
            )
        }
        PreprocessError::Settings {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fix the TOML syntax or remove unknown keys from the settings file"),
        _ => ErrorContext::new(error),
    }
}
