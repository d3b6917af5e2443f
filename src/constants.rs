//! Global constants used throughout the PPRB codebase.
//!
//! File names, directory names and the fixed tokens of the generated Lua
//! program live here so the generator, the resolver and the runtime agree
//! on them.

/// Rules file looked up along the search path when no other name is configured.
pub const DEFAULT_RULES_FILE: &str = "pprb.rules";

/// Extension appended to a module name by `use(name)`.
pub const DEFAULT_MODULE_EXTENSION: &str = "pprb.i";

/// Subdirectory of every search-path directory that is also searched.
pub const DEFAULT_MODULES_DIR: &str = "pprb_modules";

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "PPRB_CONFIG";

/// Name of the global Lua function that appends to the output buffer.
pub const OUTPUT_FUNCTION: &str = "__out";

/// Prefix of the chunk names given to every piece of executed code.
///
/// The full name is `pprb#<index>`; Lua reports it verbatim in error
/// positions and stack frames, which is how failures are traced back to
/// their originating file and line.
pub const CHUNK_TAG_PREFIX: &str = "pprb#";

/// Display name used for inputs that were not read from a file.
pub const ANONYMOUS_SOURCE: &str = "<input>";

/// Directories at which the upward search-path walk stops.
pub const SEARCH_PATH_STOP_DIRS: &[&str] = &["/", "/cygdrive"];
