//! Processing modes and the block stack.

use std::fmt;

/// How the content of a line is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Content is literal output text
    #[default]
    Template,
    /// Content is Lua statements
    Code,
}

impl Mode {
    /// The other mode.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Template => Self::Code,
            Self::Code => Self::Template,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Code => f.write_str("code"),
        }
    }
}

/// Stack of open block modes. Never empty: the start mode sits below every
/// open block and cannot be popped.
#[derive(Debug, Clone)]
pub struct ModeStack {
    start: Mode,
    open: Vec<Mode>,
}

impl ModeStack {
    /// Create a stack holding only the start mode.
    #[must_use]
    pub fn new(start: Mode) -> Self {
        Self {
            start,
            open: Vec::new(),
        }
    }

    /// The mode of the innermost open block, or the start mode.
    #[must_use]
    pub fn top(&self) -> Mode {
        self.open.last().copied().unwrap_or(self.start)
    }

    pub fn push(&mut self, mode: Mode) {
        self.open.push(mode);
    }

    /// Close the innermost block and return its mode, or `None` when only
    /// the start mode remains.
    pub fn pop(&mut self) -> Option<Mode> {
        self.open.pop()
    }

    /// Number of open blocks, the start mode excluded.
    #[must_use]
    pub fn open_blocks(&self) -> usize {
        self.open.len()
    }
}
