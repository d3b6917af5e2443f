//! Configuration management for PPRB.
//!
//! Only user-wide [`Settings`] live here. Per-directory behavior is
//! configured by rules files, which are Lua code and handled by the runtime.

mod settings;

pub use settings::Settings;
