//! Test utilities for PPRB
//!
//! Helpers for building directory trees of inputs, rules files and
//! modules, and for enabling logging in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use pprb::test_utils::TestTree;
//!
//! let tree = TestTree::new().unwrap();
//! tree.write("pprb.rules", "profile('comment_embedded')").unwrap();
//! let page = tree.write("src/main.c", "// %if true\nint x;\n// -\n").unwrap();
//! let output = pprb::render(&tree.source("src/main.c").unwrap(), None).unwrap();
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::engine::Source;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=pprb=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A temporary directory tree, removed on drop.
pub struct TestTree {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestTree {
    /// Create an empty tree.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let root = temp_dir.path().canonicalize()?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
        })
    }

    /// Root directory of the tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `relative` inside the tree.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write a file, creating parent directories, and return its path.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Create a directory, with parents.
    pub fn mkdir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Load a file of the tree as a [`Source`].
    pub fn source(&self, relative: &str) -> Result<Source> {
        Ok(Source::from_file(self.path(relative))?)
    }
}
