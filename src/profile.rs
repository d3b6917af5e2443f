//! Directive-matching profiles.
//!
//! A [`PatternTable`] holds the four regular expressions the classifier
//! consults for every line: block start, block end, line escape and inline
//! expression. Capture group 1 of the block-start, line-escape and
//! inline-expression patterns is the directive's content.
//!
//! Two built-in [`Profile`]s seed the table:
//!
//! | Profile            | Block start | Block end | Line escape | Inline expression |
//! |--------------------|-------------|-----------|-------------|-------------------|
//! | `default`          | `%code`     | `-`       | `>code`     | `` `expr` ``      |
//! | `comment_embedded` | `// %code`  | `// -`    | `// >code`  | `lua_name_`       |
//!
//! The table is mutated through [`Overlay`]s, which replace individual
//! patterns by key, and through [`ProfileRequest`]s, which combine a named
//! profile with an optional overlay. Keys are validated against the fixed
//! [`PatternKey`] set; unknown keys and uncompilable patterns are
//! configuration errors.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use strsim::levenshtein;

use crate::core::PreprocessError;

/// Maximum Levenshtein distance, as a percentage of the input length, for a
/// name to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// One of the four pattern slots of a [`PatternTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKey {
    /// Opens a block; content is code (or the `lua` raw-code marker)
    BlockStart,
    /// Closes the innermost block
    BlockEnd,
    /// A single line in the opposite mode
    LineEscape,
    /// Expression spliced into literal text
    InlineExpression,
}

impl PatternKey {
    /// Every key, in table order.
    pub const ALL: [Self; 4] =
        [Self::BlockStart, Self::BlockEnd, Self::LineEscape, Self::InlineExpression];

    /// The canonical overlay key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BlockStart => "block_start",
            Self::BlockEnd => "block_end",
            Self::LineEscape => "line_escape",
            Self::InlineExpression => "inline_expression",
        }
    }

    const fn camel_name(self) -> &'static str {
        match self {
            Self::BlockStart => "blockStart",
            Self::BlockEnd => "blockEnd",
            Self::LineEscape => "lineEscape",
            Self::InlineExpression => "inlineExpression",
        }
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKey {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|key| key.name() == s || key.camel_name() == s).ok_or_else(
            || PreprocessError::UnknownOption {
                key: s.to_string(),
                similar: find_similar(s, Self::ALL.iter().map(|key| key.name())),
            },
        )
    }
}

/// Built-in named pattern bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Plain `%`, `-`, `>` and backtick markers
    #[default]
    Default,
    /// The same roles behind a `//` line comment, so the input stays valid
    /// source in C-like languages
    CommentEmbedded,
}

impl Profile {
    /// Every built-in profile.
    pub const ALL: [Self; 2] = [Self::Default, Self::CommentEmbedded];

    /// The name scripts use to select the profile.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::CommentEmbedded => "comment_embedded",
        }
    }

    /// Pattern sources of the profile, keyed by slot.
    #[must_use]
    pub const fn sources(self) -> [(PatternKey, &'static str); 4] {
        match self {
            Self::Default => [
                (PatternKey::BlockStart, r"^%(.*)"),
                (PatternKey::BlockEnd, r"^-$"),
                (PatternKey::LineEscape, r"^>(.*)"),
                (PatternKey::InlineExpression, r"`(.*?)`"),
            ],
            Self::CommentEmbedded => [
                (PatternKey::BlockStart, r"^//\s*%(.*)"),
                (PatternKey::BlockEnd, r"^//\s*-$"),
                (PatternKey::LineEscape, r"^//\s*>(.*)"),
                (PatternKey::InlineExpression, r"\blua_(\w+?)_\b"),
            ],
        }
    }

    fn compiled(self) -> &'static PatternTable {
        static DEFAULT: LazyLock<PatternTable> =
            LazyLock::new(|| PatternTable::compile_builtin(Profile::Default));
        static COMMENT_EMBEDDED: LazyLock<PatternTable> =
            LazyLock::new(|| PatternTable::compile_builtin(Profile::CommentEmbedded));

        match self {
            Self::Default => &DEFAULT,
            Self::CommentEmbedded => &COMMENT_EMBEDDED,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "comment_embedded" | "commentEmbedded" | "c_parsable" => Ok(Self::CommentEmbedded),
            _ => Err(PreprocessError::UnknownProfile {
                name: s.to_string(),
                similar: find_similar(s, Self::ALL.iter().map(|profile| profile.name())),
            }),
        }
    }
}

/// The active directive-matching patterns.
#[derive(Debug, Clone)]
pub struct PatternTable {
    block_start: Regex,
    block_end: Regex,
    line_escape: Regex,
    inline_expression: Regex,
}

impl PatternTable {
    /// Create a table seeded from a built-in profile.
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        profile.compiled().clone()
    }

    fn compile_builtin(profile: Profile) -> Self {
        let [block_start, block_end, line_escape, inline_expression] =
            profile.sources().map(|(_, source)| {
                Regex::new(source).expect("built-in profile patterns are valid")
            });
        Self {
            block_start,
            block_end,
            line_escape,
            inline_expression,
        }
    }

    /// The pattern in slot `key`.
    #[must_use]
    pub fn get(&self, key: PatternKey) -> &Regex {
        match key {
            PatternKey::BlockStart => &self.block_start,
            PatternKey::BlockEnd => &self.block_end,
            PatternKey::LineEscape => &self.line_escape,
            PatternKey::InlineExpression => &self.inline_expression,
        }
    }

    /// Replace the pattern in slot `key`.
    pub fn set(&mut self, key: PatternKey, pattern: Regex) {
        let slot = match key {
            PatternKey::BlockStart => &mut self.block_start,
            PatternKey::BlockEnd => &mut self.block_end,
            PatternKey::LineEscape => &mut self.line_escape,
            PatternKey::InlineExpression => &mut self.inline_expression,
        };
        *slot = pattern;
    }

    /// Replace every pattern with those of a built-in profile.
    pub fn apply_profile(&mut self, profile: Profile) {
        *self = Self::new(profile);
    }

    /// Replace the patterns named by the overlay; the others are untouched.
    pub fn apply_overlay(&mut self, overlay: &Overlay) {
        for (key, pattern) in &overlay.entries {
            self.set(*key, pattern.clone());
        }
    }

    /// Apply a profile request: named profile first, then the overlay.
    ///
    /// # Errors
    ///
    /// [`PreprocessError::MissingProfileOrOverlay`] when the request is empty.
    pub fn apply(&mut self, request: &ProfileRequest) -> Result<(), PreprocessError> {
        if request.is_empty() {
            return Err(PreprocessError::MissingProfileOrOverlay);
        }
        if let Some(profile) = request.profile {
            self.apply_profile(profile);
        }
        if let Some(overlay) = &request.overlay {
            self.apply_overlay(overlay);
        }
        Ok(())
    }

    /// Capture group 1 of `key`'s pattern in `text`, or `None` when the
    /// pattern does not match. A pattern without group 1 captures "".
    pub fn capture<'t>(&self, key: PatternKey, text: &'t str) -> Option<&'t str> {
        self.get(key)
            .captures(text)
            .map(|captures| captures.get(1).map_or("", |content| content.as_str()))
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::new(Profile::Default)
    }
}

/// A set of pattern replacements keyed by [`PatternKey`].
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    entries: Vec<(PatternKey, Regex)>,
}

impl Overlay {
    /// Create an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `key` and compile `pattern` into the overlay.
    ///
    /// # Errors
    ///
    /// - [`PreprocessError::UnknownOption`] for a key outside the table
    /// - [`PreprocessError::InvalidOptionValue`] when the regex does not compile
    pub fn insert(&mut self, key: &str, pattern: &str) -> Result<(), PreprocessError> {
        let key = key.parse::<PatternKey>()?;
        let pattern = Regex::new(pattern).map_err(|e| PreprocessError::InvalidOptionValue {
            key: key.name().to_string(),
            reason: e.to_string(),
        })?;
        self.entries.retain(|(existing, _)| *existing != key);
        self.entries.push((key, pattern));
        Ok(())
    }

    /// Builder form of [`Overlay::insert`].
    ///
    /// # Errors
    ///
    /// Same as [`Overlay::insert`].
    pub fn with(mut self, key: &str, pattern: &str) -> Result<Self, PreprocessError> {
        self.insert(key, pattern)?;
        Ok(self)
    }

    /// Whether the overlay replaces nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named profile and/or an overlay, as passed to `profile(...)`.
#[derive(Debug, Clone, Default)]
pub struct ProfileRequest {
    /// Built-in profile to load first
    pub profile: Option<Profile>,
    /// Replacements applied after the profile
    pub overlay: Option<Overlay>,
}

impl ProfileRequest {
    /// Whether the request names neither a profile nor an overlay.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.overlay.is_none()
    }
}

fn find_similar<'a>(target: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut scored: Vec<_> =
        candidates.map(|candidate| (candidate, levenshtein(target, candidate))).collect();
    scored.sort_by_key(|(_, distance)| *distance);
    scored
        .into_iter()
        .filter(|(_, distance)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .map(|(candidate, _)| candidate.to_string())
        .collect()
}
