//! Line classification against the active pattern table.

use crate::profile::{PatternKey, PatternTable};

/// What a single input line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Opens a block; carries the captured content
    BlockStart(String),
    /// Closes the innermost block
    BlockEnd,
    /// One line of the opposite mode; carries the captured content
    LineEscape(String),
    /// Anything else: content in the current mode
    Literal,
}

/// Classify a trimmed line. Block start wins over block end, which wins
/// over line escape.
pub fn classify(trimmed: &str, table: &PatternTable) -> Directive {
    if let Some(content) = table.capture(PatternKey::BlockStart, trimmed) {
        return Directive::BlockStart(content.to_string());
    }
    if table.get(PatternKey::BlockEnd).is_match(trimmed) {
        return Directive::BlockEnd;
    }
    if let Some(content) = table.capture(PatternKey::LineEscape, trimmed) {
        return Directive::LineEscape(content.to_string());
    }
    Directive::Literal
}
