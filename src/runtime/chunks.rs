//! Origin tags for executed code.
//!
//! Every program handed to Lua is registered here first and loaded under
//! the chunk name `pprb#<index>`. Lua repeats that name in error positions
//! and stack frames, so a failure can be mapped back to the file and input
//! line that generated the failing code.

use regex::Regex;
use std::rc::Rc;
use std::sync::LazyLock;

use super::diagnostic::Frame;
use crate::constants::CHUNK_TAG_PREFIX;
use crate::engine::Program;

static POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}(\d+):(\d+):\s*", regex::escape(CHUNK_TAG_PREFIX)))
        .expect("valid built-in pattern")
});

#[derive(Debug)]
struct ChunkOrigin {
    file: String,
    program: Rc<Program>,
}

/// Registered chunks of one render, indexed by tag number.
#[derive(Debug, Default)]
pub(crate) struct ChunkRegistry {
    chunks: Vec<ChunkOrigin>,
}

impl ChunkRegistry {
    /// Register a program and return the chunk name to load it under.
    pub(crate) fn register(&mut self, file: impl Into<String>, program: Rc<Program>) -> String {
        self.chunks.push(ChunkOrigin {
            file: file.into(),
            program,
        });
        format!("{CHUNK_TAG_PREFIX}{}", self.chunks.len() - 1)
    }

    /// Map a chunk tag and program line to `(file, source line)`.
    pub(crate) fn resolve(&self, tag: &str, program_line: i32) -> Option<(String, usize)> {
        let index: usize = tag.strip_prefix(CHUNK_TAG_PREFIX)?.parse().ok()?;
        let program_line = usize::try_from(program_line).ok().filter(|line| *line > 0)?;
        let chunk = self.chunks.get(index)?;
        Some((chunk.file.clone(), chunk.program.source_line(program_line)))
    }

    /// Locate the first `pprb#N:L:` position inside an error message.
    pub(crate) fn locate_message(&self, message: &str) -> Option<(String, usize)> {
        let captures = POSITION.captures(message)?;
        let tag = format!("{CHUNK_TAG_PREFIX}{}", &captures[1]);
        let line = captures[2].parse().ok()?;
        self.resolve(&tag, line)
    }

    /// Render a frame, translating chunk positions to source positions.
    pub(crate) fn describe(&self, frame: &Frame) -> String {
        let location = match self.resolve(&frame.source, frame.line) {
            Some((file, line)) => format!("{file}:{line}"),
            None if frame.line > 0 => format!("{}:{}", frame.source, frame.line),
            None => frame.source.clone(),
        };
        format!("{location}: in {}", frame.function())
    }
}

/// Drop a leading `pprb#N:L: ` position from a Lua error message.
pub(crate) fn strip_position(message: &str) -> &str {
    match POSITION.find(message) {
        Some(position) if position.start() == 0 => &message[position.end()..],
        _ => message,
    }
}
