//! Execution of generated programs.
//!
//! A [`Runtime`] owns one Lua state and the [`Session`] state shared with
//! the script callbacks: the active pattern table, the output buffer, the
//! collected diagnostics and the chunk registry. Rules files, modules and
//! the top-level program all execute in the same Lua state, so globals
//! defined by one are visible to the next.
//!
//! # Failure handling
//!
//! Every chunk runs under `xpcall` with a message handler that snapshots
//! the Lua stack. When the chunk fails, the error is classified:
//!
//! - an error raised by a callback with a fatal [`PreprocessError`] is
//!   propagated unchanged
//! - an error whose stack reaches a registered chunk becomes a
//!   [`Diagnostic`], reported and skipped at the nearest boundary
//! - anything else is [`PreprocessError::Unrecoverable`]
//!
//! Deep stacks, such as runaway recursion, keep only their innermost and
//! outermost levels in the backtrace.

mod bindings;
mod chunks;
mod diagnostic;

pub use diagnostic::Diagnostic;

use mlua::{Function, Lua, Value};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, trace};

use chunks::{ChunkRegistry, strip_position};
use diagnostic::Frame;

use crate::config::Settings;
use crate::core::PreprocessError;
use crate::engine::{Mode, Program, compile_program};
use crate::profile::PatternTable;
use crate::search_path::SearchPath;

/// State of one render, shared between the engine and script callbacks.
pub(crate) struct Session {
    pub(crate) patterns: RefCell<PatternTable>,
    pub(crate) search_path: SearchPath,
    pub(crate) input_path: Option<PathBuf>,
    pub(crate) settings: Settings,
    output: RefCell<String>,
    diagnostics: RefCell<Vec<Diagnostic>>,
    chunks: RefCell<ChunkRegistry>,
    echo_diagnostics: bool,
}

impl Session {
    pub(crate) fn new(
        patterns: PatternTable,
        search_path: SearchPath,
        input_path: Option<PathBuf>,
        settings: Settings,
        echo_diagnostics: bool,
    ) -> Self {
        Self {
            patterns: RefCell::new(patterns),
            search_path,
            input_path,
            settings,
            output: RefCell::default(),
            diagnostics: RefCell::default(),
            chunks: RefCell::default(),
            echo_diagnostics,
        }
    }

    pub(crate) fn append_output(&self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    pub(crate) fn output(&self) -> String {
        self.output.borrow().clone()
    }

    pub(crate) fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    fn report(&self, diagnostic: Diagnostic) {
        debug!("Reporting {}", diagnostic.headline());
        if self.echo_diagnostics {
            eprintln!("{diagnostic}");
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Report recoverable failures; hand fatal ones back.
    fn recover(&self, result: Result<(), PreprocessError>) -> Result<(), PreprocessError> {
        match result {
            Err(PreprocessError::Evaluation(diagnostic)) => {
                debug!("Recovered from evaluation error in {}", diagnostic.file);
                self.report(*diagnostic);
                Ok(())
            }
            other => other,
        }
    }

    fn translate_failure(&self, error: Value, stack: &CapturedStack) -> PreprocessError {
        let message = match &error {
            Value::Error(inner) => {
                if let Some(fatal) = fatal_cause(inner) {
                    return fatal;
                }
                root_message(inner)
            }
            Value::String(text) => text.to_string_lossy().into(),
            other => error_object_message(other),
        };

        let chunks = self.chunks.borrow();
        let origin =
            stack.frames.iter().find_map(|frame| chunks.resolve(&frame.source, frame.line));
        match origin {
            Some((file, line)) => {
                let mut backtrace: Vec<String> =
                    stack.frames.iter().map(|frame| chunks.describe(frame)).collect();
                if stack.skipped > 0 {
                    let at = BACKTRACE_HEAD.min(backtrace.len());
                    backtrace.insert(at, format!("... (skipping {} levels)", stack.skipped));
                }
                PreprocessError::Evaluation(Box::new(Diagnostic::new(
                    file,
                    line,
                    strip_position(&message),
                    backtrace,
                )))
            }
            None => PreprocessError::Unrecoverable {
                message,
            },
        }
    }

    fn translate_load_failure(&self, error: &mlua::Error) -> PreprocessError {
        if let Some(fatal) = fatal_cause(error) {
            return fatal;
        }
        let message = root_message(error);
        match self.chunks.borrow().locate_message(&message) {
            Some((file, line)) => PreprocessError::Evaluation(Box::new(Diagnostic::new(
                file.clone(),
                line,
                strip_position(&message),
                vec![format!("{file}:{line}: in main chunk")],
            ))),
            None => PreprocessError::Unrecoverable {
                message,
            },
        }
    }
}

/// A Lua state bound to one render.
pub struct Runtime {
    lua: Lua,
    session: Rc<Session>,
}

impl Runtime {
    pub(crate) fn new(session: Session) -> Result<Self, PreprocessError> {
        let lua = Lua::new();
        let session = Rc::new(session);
        bindings::install(&lua, &session).map_err(|e| PreprocessError::Unrecoverable {
            message: format!("failed to install script bindings: {e}"),
        })?;
        Ok(Self {
            lua,
            session,
        })
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Execute every `rules_file` on the search path, outermost first.
    ///
    /// Evaluation errors in one rules file are reported and the next file
    /// still runs.
    pub(crate) fn load_rules(&self, rules_file: &str) -> Result<(), PreprocessError> {
        for path in self.session.search_path.find_all(rules_file) {
            debug!("Loading rules from {}", path.display());
            let code = fs::read_to_string(&path).map_err(|e| PreprocessError::io(&path, &e))?;
            let program = Rc::new(Program::verbatim(&code));
            let result = execute(&self.lua, &self.session, program, &path.display().to_string());
            self.session.recover(result)?;
        }
        Ok(())
    }

    /// Execute the top-level program.
    pub(crate) fn run(&self, program: Rc<Program>, origin: &str) -> Result<(), PreprocessError> {
        let result = execute(&self.lua, &self.session, program, origin);
        self.session.recover(result)
    }
}

/// Compile and execute every `<name>.<ext>` module on the search path.
///
/// Modules start in code mode with the default pattern table and never
/// load rules.
fn use_module(lua: &Lua, session: &Rc<Session>, name: &str) -> Result<(), PreprocessError> {
    let file_name = session.settings.module_file_name(name);
    let found = session.search_path.find_all(&file_name);
    if found.is_empty() {
        return Err(PreprocessError::ModuleNotFound {
            name: name.to_string(),
            file_name,
            searched: session.search_path.len(),
        });
    }

    for path in found {
        debug!("Using module '{}' from {}", name, path.display());
        let origin = path.display().to_string();
        let text = fs::read_to_string(&path).map_err(|e| PreprocessError::io(&path, &e))?;
        let program = compile_program(&text, Mode::Code, &PatternTable::default(), &origin)?;
        let result = execute(lua, session, Rc::new(program), &origin);
        session.recover(result)?;
    }
    Ok(())
}

fn execute(
    lua: &Lua,
    session: &Session,
    program: Rc<Program>,
    origin: &str,
) -> Result<(), PreprocessError> {
    let tag = session.chunks.borrow_mut().register(origin, Rc::clone(&program));
    trace!("Executing {} as {}", origin, tag);

    let chunk = match lua.load(program.text()).set_name(format!("={tag}")).into_function() {
        Ok(chunk) => chunk,
        Err(error) => return Err(session.translate_load_failure(&error)),
    };

    let stack: Rc<RefCell<CapturedStack>> = Rc::default();
    let captured = Rc::clone(&stack);
    let handler = lua
        .create_function(move |lua, error: Value| {
            *captured.borrow_mut() = capture_stack(lua);
            Ok(error)
        })
        .map_err(unrecoverable)?;

    let xpcall: Function = lua.globals().get("xpcall").map_err(unrecoverable)?;
    let (ok, error): (bool, Value) = xpcall.call((chunk, handler)).map_err(unrecoverable)?;
    if ok {
        return Ok(());
    }

    let stack = stack.take();
    Err(session.translate_failure(error, &stack))
}

/// Innermost levels kept from a deep stack.
const BACKTRACE_HEAD: usize = 10;
/// Outermost levels kept from a deep stack.
const BACKTRACE_TAIL: usize = 11;

/// Stack levels seen by the message handler, innermost first. Levels
/// between the head and the tail of a deep stack are only counted.
#[derive(Debug, Default)]
struct CapturedStack {
    frames: Vec<Frame>,
    skipped: usize,
}

fn capture_stack(lua: &Lua) -> CapturedStack {
    let depth = stack_depth(lua);
    let (levels, skipped): (Vec<usize>, usize) = if depth > BACKTRACE_HEAD + BACKTRACE_TAIL {
        let levels = (1..=BACKTRACE_HEAD).chain(depth - BACKTRACE_TAIL + 1..=depth).collect();
        (levels, depth - BACKTRACE_HEAD - BACKTRACE_TAIL)
    } else {
        ((1..=depth).collect(), 0)
    };

    let frames = levels
        .into_iter()
        .filter_map(|level| {
            let debug = lua.inspect_stack(level)?;
            let source = debug.source();
            Some(Frame {
                source: source.short_src.map_or_else(|| "?".to_string(), |src| src.to_string()),
                line: debug.curr_line(),
                name: debug.names().name.map(|name| name.to_string()),
                what: source.what,
            })
        })
        .collect();

    CapturedStack {
        frames,
        skipped,
    }
}

/// Outermost stack level above the handler, or 0 for an empty stack.
///
/// Every lookup walks the call chain from the top, so the depth is found by
/// doubling and then bisecting rather than level by level.
fn stack_depth(lua: &Lua) -> usize {
    if lua.inspect_stack(1).is_none() {
        return 0;
    }
    let (mut present, mut absent) = (1, 2);
    while lua.inspect_stack(absent).is_some() {
        present = absent;
        absent *= 2;
    }
    while absent - present > 1 {
        let middle = present + (absent - present) / 2;
        if lua.inspect_stack(middle).is_some() {
            present = middle;
        } else {
            absent = middle;
        }
    }
    present
}

/// Message for an error object that is not a string, worded the way the
/// standalone Lua interpreter words it.
fn error_object_message(value: &Value) -> String {
    let printable = match value {
        Value::Integer(_) | Value::Number(_) => true,
        Value::Table(table) => table
            .metatable()
            .is_some_and(|meta| meta.contains_key("__tostring").unwrap_or(false)),
        _ => false,
    };
    match value.to_string() {
        Ok(text) if printable => text,
        _ => format!("(error object is a {} value)", value.type_name()),
    }
}

/// A fatal [`PreprocessError`] raised by a callback, however deeply mlua
/// wrapped it.
fn fatal_cause(error: &mlua::Error) -> Option<PreprocessError> {
    match error {
        mlua::Error::ExternalError(inner) => inner
            .downcast_ref::<PreprocessError>()
            .filter(|inner| inner.is_fatal())
            .cloned(),
        mlua::Error::CallbackError {
            cause,
            ..
        }
        | mlua::Error::WithContext {
            cause,
            ..
        } => fatal_cause(cause),
        _ => None,
    }
}

/// The innermost message of an mlua error, without mlua's decorations.
fn root_message(error: &mlua::Error) -> String {
    match error {
        mlua::Error::RuntimeError(message)
        | mlua::Error::SyntaxError {
            message,
            ..
        } => message.clone(),
        mlua::Error::CallbackError {
            cause,
            ..
        }
        | mlua::Error::WithContext {
            cause,
            ..
        } => root_message(cause),
        mlua::Error::ExternalError(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

fn unrecoverable(error: mlua::Error) -> PreprocessError {
    PreprocessError::Unrecoverable {
        message: error.to_string(),
    }
}
