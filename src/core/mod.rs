//! Core types and error handling for PPRB
//!
//! # Error Handling
//!
//! [`PreprocessError`] enumerates every failure mode of the preprocessor,
//! [`ErrorCategory`] places each one in the error taxonomy, and
//! [`ErrorContext`] pairs an error with details and a suggestion for CLI
//! display. [`user_friendly_error`] converts any [`anyhow::Error`] into that
//! form.

pub mod error;

pub use error::{ErrorCategory, ErrorContext, PreprocessError, user_friendly_error};

/// Result alias used by the library surface.
pub type Result<T, E = PreprocessError> = std::result::Result<T, E>;
