//! Lua code generation for classified content.
//!
//! Literal text becomes arguments of `__out("...")` calls, code passes
//! through untouched. Consecutive text emissions share one open string
//! literal; switching to code closes it, switching back opens a new call.
//!
//! Newlines inside text are written as a backslash followed by a real
//! newline, which Lua reads as a newline character. Every input line
//! therefore contributes its own newline to the program, and the
//! [`Program`] line map records which input line each program line came
//! from.

use regex::Regex;

use super::mode::Mode;
use crate::constants::OUTPUT_FUNCTION;

/// Generated Lua program plus its origin information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    text: String,
    line_map: Vec<usize>,
}

impl Program {
    /// Wrap code that was not generated (rules files): program line `n`
    /// is source line `n`.
    #[must_use]
    pub fn verbatim(code: &str) -> Self {
        let lines = code.split('\n').count();
        Self {
            text: code.to_string(),
            line_map: (1..=lines).collect(),
        }
    }

    /// The Lua source.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source line that produced 1-based `program_line`.
    #[must_use]
    pub fn source_line(&self, program_line: usize) -> usize {
        match self.line_map.get(program_line.saturating_sub(1)) {
            Some(line) => *line,
            None => self.line_map.last().copied().unwrap_or(program_line),
        }
    }
}

/// Appends emissions to a growing [`Program`].
#[derive(Debug)]
pub struct CodeGenerator {
    text: String,
    line_map: Vec<usize>,
    at_line_start: bool,
    last_emitted: Mode,
    source_line: usize,
}

impl CodeGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            line_map: Vec::new(),
            at_line_start: true,
            last_emitted: Mode::Code,
            source_line: 1,
        }
    }

    /// Attribute subsequent emissions to source line `line`.
    pub fn set_source_line(&mut self, line: usize) {
        self.source_line = line;
    }

    /// Mode of the most recent emission.
    #[must_use]
    pub fn last_emitted(&self) -> Mode {
        self.last_emitted
    }

    /// Append `fragment` as content of `mode`. Text is escaped, with
    /// `inline` locating the expressions to splice.
    pub fn emit(&mut self, fragment: &str, mode: Mode, inline: &Regex) {
        match mode {
            Mode::Code => {
                if self.last_emitted == Mode::Template {
                    self.push("\"); ");
                }
                self.push(fragment);
            }
            Mode::Template => {
                let escaped = escape_text(fragment, inline);
                if self.last_emitted == Mode::Code {
                    self.push(OUTPUT_FUNCTION);
                    self.push("(\"");
                }
                self.push(&escaped);
            }
        }
        self.last_emitted = mode;
    }

    /// Close any open text literal and hand out the program.
    #[must_use]
    pub fn finish(mut self) -> Program {
        if self.last_emitted == Mode::Template {
            self.push("\")");
        }
        Program {
            text: self.text,
            line_map: self.line_map,
        }
    }

    fn push(&mut self, fragment: &str) {
        for ch in fragment.chars() {
            if self.at_line_start {
                self.line_map.push(self.source_line);
                self.at_line_start = false;
            }
            if ch == '\n' {
                self.at_line_start = true;
            }
        }
        self.text.push_str(fragment);
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape literal text for the inside of a Lua string and splice in the
/// expressions matched by `inline` (capture group 1).
///
/// Each expression is evaluated exactly once, in order, and its value is
/// written where the delimited expression stood. Empty expressions vanish.
pub fn escape_text(text: &str, inline: &Regex) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    let mut last = 0;

    for captures in inline.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        escape_into(&mut escaped, &text[last..whole.start()]);
        let expression = captures.get(1).map_or("", |content| content.as_str());
        if !expression.trim().is_empty() {
            escaped.push_str("\") ");
            escaped.push_str(OUTPUT_FUNCTION);
            escaped.push_str("((");
            escaped.push_str(expression);
            escaped.push_str(")) ");
            escaped.push_str(OUTPUT_FUNCTION);
            escaped.push_str("(\"");
        }
        last = whole.end();
    }

    escape_into(&mut escaped, &text[last..]);
    escaped
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push('\t'),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
}
