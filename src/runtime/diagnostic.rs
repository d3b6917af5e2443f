//! Recoverable-failure reports.
//!
//! The rendered text of a [`Diagnostic`] is a stable contract: editor
//! integrations parse its first line (`file:line: error: message`) to put a
//! marker on the failing line.
//!
//! ```text
//! site/index.html:12: error: attempt to call a nil value (global 'helper')
//!
//! Backtrace:
//! site/index.html:12: in main chunk
//! [C]: in function 'xpcall'
//! Working directory: /work
//! ```

use std::fmt;
use std::path::PathBuf;

/// A located evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File whose code failed
    pub file: String,
    /// 1-based line in `file`
    pub line: usize,
    /// The failure message, without Lua's position prefix
    pub message: String,
    /// Stack frames at the point of failure, innermost first
    pub backtrace: Vec<String>,
    /// Process working directory when the failure was reported
    pub working_dir: PathBuf,
}

impl Diagnostic {
    pub(crate) fn new(
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
        backtrace: Vec<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
            backtrace,
            working_dir: std::env::current_dir().unwrap_or_default(),
        }
    }

    /// The `file:line: error: message` line.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("{}:{}: error: {}", self.file, self.line, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline())?;
        writeln!(f)?;
        writeln!(f, "Backtrace:")?;
        for frame in &self.backtrace {
            writeln!(f, "{frame}")?;
        }
        write!(f, "Working directory: {}", self.working_dir.display())
    }
}

/// One stack level captured when executed code raised an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Lua's short source name: a chunk tag, `[C]`, or a file name
    pub source: String,
    /// Current line, or a negative number when unknown
    pub line: i32,
    /// Function name, when Lua could infer one
    pub name: Option<String>,
    /// `"Lua"`, `"C"` or `"main"`
    pub what: &'static str,
}

impl Frame {
    pub(crate) fn function(&self) -> String {
        match (&self.name, self.what) {
            (Some(name), _) => format!("function '{name}'"),
            (None, "main") => "main chunk".to_string(),
            _ => "?".to_string(),
        }
    }
}
