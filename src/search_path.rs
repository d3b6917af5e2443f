//! Directory chain used to resolve rules files and modules.
//!
//! The search path of an input is every directory from the input's own
//! directory up to the filesystem root. Walking upwards, each directory is
//! followed by its modules subdirectory (`pprb_modules` unless configured
//! otherwise) when one exists. The walk is then reversed so the list is
//! ordered outermost first: the directory holding the input comes last and
//! anything it defines is applied last, and a modules subdirectory comes
//! just before the directory that contains it.
//!
//! ```text
//! /work/site/pages/index.html
//!
//! /pprb_modules          (only if it exists)
//! /
//! /work
//! /work/site/pprb_modules
//! /work/site
//! /work/site/pages
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::constants::SEARCH_PATH_STOP_DIRS;

/// Ordered list of directories searched for rules files and modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// A search path with no directories; nothing ever resolves.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the search path for `input`, which should be absolute.
    #[must_use]
    pub fn for_input(input: &Path, modules_dir: &str) -> Self {
        let mut dirs = Vec::new();
        let Some(mut dir) = input.parent().map(Path::to_path_buf) else {
            return Self::empty();
        };

        loop {
            let modules = dir.join(modules_dir);
            let has_modules = modules.is_dir();
            dirs.push(dir.clone());
            if has_modules {
                dirs.push(modules);
            }

            if SEARCH_PATH_STOP_DIRS.iter().any(|stop| dir == Path::new(stop)) {
                break;
            }
            match dir.parent() {
                Some(parent) if parent != dir && !parent.as_os_str().is_empty() => {
                    dir = parent.to_path_buf();
                }
                _ => break,
            }
        }

        dirs.reverse();
        debug!("Search path for {}: {} directories", input.display(), dirs.len());
        Self {
            dirs,
        }
    }

    /// The directories, outermost first.
    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Every existing `<dir>/<file_name>`, in search-path order.
    #[must_use]
    pub fn find_all(&self, file_name: &str) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .filter(|candidate| {
                let exists = candidate.is_file();
                trace!("Probing {}: {}", candidate.display(), exists);
                exists
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
