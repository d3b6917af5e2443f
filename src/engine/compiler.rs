//! The block state machine: drives the generator from classified lines.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use super::classifier::{Directive, classify};
use super::generator::{CodeGenerator, Program};
use super::mode::{Mode, ModeStack};
use crate::core::PreprocessError;
use crate::profile::{PatternKey, PatternTable};

/// Block-start content switching straight into code mode.
static RAW_CODE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*lua\b").expect("valid built-in pattern"));

/// Lua constructs that open a scope closed by `end`.
static SCOPE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function|for|while|if|do)\b").expect("valid built-in pattern")
});

static CONDITIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*if\b").expect("valid built-in pattern"));
static ENDS_WITH_THEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bthen$").expect("valid built-in pattern"));
static LOOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:for|while)\b").expect("valid built-in pattern"));
static ENDS_WITH_DO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdo$").expect("valid built-in pattern"));

/// Compile `text` into a Lua program.
///
/// `origin` names the input in structural errors.
///
/// # Errors
///
/// [`PreprocessError::UnmatchedBlockEnd`] when a block end has nothing to close.
pub fn compile_program(
    text: &str,
    start: Mode,
    table: &PatternTable,
    origin: &str,
) -> Result<Program, PreprocessError> {
    let mut compiler = Compiler::new(start, table, origin);
    for (index, line) in text.split_inclusive('\n').enumerate() {
        compiler.process_line(index + 1, line)?;
    }
    trace!("Compiled {} with {} block(s) left open", origin, compiler.stack.open_blocks());
    Ok(compiler.generator.finish())
}

struct Compiler<'a> {
    stack: ModeStack,
    generator: CodeGenerator,
    table: &'a PatternTable,
    origin: &'a str,
}

impl<'a> Compiler<'a> {
    fn new(start: Mode, table: &'a PatternTable, origin: &'a str) -> Self {
        Self {
            stack: ModeStack::new(start),
            generator: CodeGenerator::new(),
            table,
            origin,
        }
    }

    fn process_line(&mut self, number: usize, line: &str) -> Result<(), PreprocessError> {
        self.generator.set_source_line(number);
        match classify(line.trim(), self.table) {
            Directive::BlockStart(content) => self.begin_block(content + "\n"),
            Directive::BlockEnd => self.end_block(number)?,
            Directive::LineEscape(content) => {
                self.emit(&(content + "\n"), self.stack.top().opposite());
            }
            Directive::Literal => self.emit(line, self.stack.top()),
        }
        Ok(())
    }

    fn begin_block(&mut self, content: String) {
        match self.stack.top() {
            Mode::Template if RAW_CODE_MARKER.is_match(&content) => {
                self.stack.push(Mode::Code);
                self.emit("", Mode::Template);
            }
            Mode::Template if SCOPE_KEYWORDS.is_match(&content) => {
                self.stack.push(Mode::Template);
                self.emit(&complete_opener(&content), Mode::Code);
            }
            Mode::Template => {
                self.stack.push(Mode::Template);
                self.emit(&format!("{} do\n", content.trim_end()), Mode::Code);
            }
            Mode::Code => {
                self.stack.push(Mode::Template);
                self.emit("do ", Mode::Code);
                self.emit(&content, Mode::Template);
            }
        }
    }

    fn end_block(&mut self, number: usize) -> Result<(), PreprocessError> {
        let closed = self.stack.pop().ok_or_else(|| PreprocessError::UnmatchedBlockEnd {
            file: self.origin.to_string(),
            line: number,
        })?;

        match closed {
            Mode::Template => self.emit("end\n", Mode::Code),
            Mode::Code => self.emit("", Mode::Template),
        }
        Ok(())
    }

    fn emit(&mut self, fragment: &str, mode: Mode) {
        self.generator.emit(fragment, mode, self.table.get(PatternKey::InlineExpression));
    }
}

/// Lua requires `then` after an `if` condition and `do` after a loop
/// header; add them when the directive left them out.
fn complete_opener(content: &str) -> String {
    let header = content.trim_end();
    if CONDITIONAL.is_match(header) && !ENDS_WITH_THEN.is_match(header) {
        format!("{header} then\n")
    } else if LOOP.is_match(header) && !ENDS_WITH_DO.is_match(header) {
        format!("{header} do\n")
    } else {
        format!("{header}\n")
    }
}
