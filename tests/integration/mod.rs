//! Integration test suite for PPRB
//!
//! End-to-end tests that render real directory trees of inputs, rules files
//! and modules, plus tests of the `pprb` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **rendering**: directive handling and rendered output
//! - **rules**: rules files along the search path and profile selection
//! - **modules**: `use` resolution and module execution
//! - **diagnostics**: error locations, diagnostic format, partial output
//! - **settings**: settings files and `PPRB_CONFIG`
//! - **cli**: the `pprb` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod diagnostics;
mod rules;
mod settings;
