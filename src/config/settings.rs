//! User settings for PPRB.
//!
//! Settings live in `~/.pprb/config.toml` (or `%LOCALAPPDATA%\pprb\config.toml`
//! on Windows). The `PPRB_CONFIG` environment variable and the `--config`
//! flag point at another file. Every key is optional:
//!
//! ```toml
//! # File executed from every search-path directory before rendering
//! rules_file = "pprb.rules"
//! # use("name") looks for "name.<module_extension>"
//! module_extension = "pprb.i"
//! # Subdirectory searched after each search-path directory
//! modules_dir = "pprb_modules"
//! # Profile active before any rules run
//! profile = "default"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_MODULE_EXTENSION, DEFAULT_MODULES_DIR, DEFAULT_RULES_FILE,
};
use crate::core::PreprocessError;
use crate::profile::Profile;

/// Settings shared by every render of one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Name of the rules file looked up along the search path
    pub rules_file: String,
    /// Extension appended to module names by `use`
    pub module_extension: String,
    /// Modules subdirectory searched after each search-path directory
    pub modules_dir: String,
    /// Built-in profile active before rules run
    pub profile: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_file: DEFAULT_RULES_FILE.to_string(),
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
            modules_dir: DEFAULT_MODULES_DIR.to_string(),
            profile: Profile::Default.name().to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `$PPRB_CONFIG` or the default location.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// [`PreprocessError::Settings`] when the file exists but cannot be read
    /// or parsed.
    pub fn load() -> Result<Self, PreprocessError> {
        Self::load_with_optional(None)
    }

    /// Load settings from `path`, falling back to `$PPRB_CONFIG` and then the
    /// default location.
    ///
    /// # Errors
    ///
    /// [`PreprocessError::Settings`] when the chosen file exists but is
    /// unreadable or malformed.
    pub fn load_with_optional(path: Option<PathBuf>) -> Result<Self, PreprocessError> {
        let path = path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(Self::default_path);

        match path {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    ///
    /// [`PreprocessError::Settings`] when the file cannot be read, is not
    /// valid TOML, contains unknown keys, or names an unknown profile.
    pub fn load_from(path: &Path) -> Result<Self, PreprocessError> {
        let content = fs::read_to_string(path).map_err(|e| PreprocessError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| PreprocessError::Settings {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;

        settings.initial_profile().map_err(|e| PreprocessError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Default settings file location, if a home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        let dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()?.join("pprb")
        } else {
            dirs::home_dir()?.join(".pprb")
        };
        Some(dir.join("config.toml"))
    }

    /// The profile named by `profile`.
    ///
    /// # Errors
    ///
    /// [`PreprocessError::UnknownProfile`] for names outside the built-in set.
    pub fn initial_profile(&self) -> Result<Profile, PreprocessError> {
        self.profile.parse()
    }

    /// File name `use(name)` looks for.
    #[must_use]
    pub fn module_file_name(&self, name: &str) -> String {
        format!("{name}.{}", self.module_extension)
    }
}
