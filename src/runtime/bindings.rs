//! Globals installed into every Lua state.
//!
//! | Global                      | Purpose                                    |
//! |-----------------------------|--------------------------------------------|
//! | `__out(value)`              | append to the output buffer                |
//! | `profile(name, [overlay])`  | switch the active pattern table            |
//! | `profile_for(glob, ...)`    | same, only for inputs matching `glob`      |
//! | `config(overlay)`           | overlay the active pattern table           |
//! | `use(name)`                 | compile and run `name.pprb.i` modules      |
//! | `pprb`                      | `version`, `path` and `dirs` of the render |
//!
//! Callbacks report failures as external errors carrying a
//! [`PreprocessError`], which the execution boundary recovers intact.

use mlua::{Function, Lua, Table, Value};
use std::rc::Rc;
use tracing::debug;

use super::Session;
use crate::constants::OUTPUT_FUNCTION;
use crate::core::PreprocessError;
use crate::pattern::PathFilter;
use crate::profile::{Overlay, ProfileRequest};

pub(super) fn install(lua: &Lua, session: &Rc<Session>) -> mlua::Result<()> {
    let globals = lua.globals();

    let output = Rc::clone(session);
    globals.set(
        OUTPUT_FUNCTION,
        lua.create_function(move |lua, value: Value| {
            let text = stringify(lua, value)?;
            output.append_output(&text);
            Ok(())
        })?,
    )?;

    let patterns = Rc::clone(session);
    globals.set(
        "profile",
        lua.create_function(move |_, (first, second): (Value, Option<Value>)| {
            let request = profile_request(first, second).map_err(mlua::Error::external)?;
            patterns.patterns.borrow_mut().apply(&request).map_err(mlua::Error::external)
        })?,
    )?;

    let filtered = Rc::clone(session);
    globals.set(
        "profile_for",
        lua.create_function(move |_, (glob, first, second): (String, Value, Option<Value>)| {
            let filter = PathFilter::new(&glob).map_err(mlua::Error::external)?;
            let request = profile_request(first, second).map_err(mlua::Error::external)?;
            let Some(path) = &filtered.input_path else {
                return Ok(());
            };
            if filter.matches(path) {
                debug!("Profile filter '{}' matches {}", filter.as_str(), path.display());
                filtered.patterns.borrow_mut().apply(&request).map_err(mlua::Error::external)?;
            }
            Ok(())
        })?,
    )?;

    let overlaid = Rc::clone(session);
    globals.set(
        "config",
        lua.create_function(move |_, overlay: Value| {
            let Value::Table(table) = overlay else {
                return Err(mlua::Error::external(PreprocessError::Configuration {
                    message: format!(
                        "config() expects an overlay table, found {}",
                        overlay.type_name()
                    ),
                }));
            };
            let request = ProfileRequest {
                profile: None,
                overlay: Some(overlay_from_table(&table).map_err(mlua::Error::external)?),
            };
            overlaid.patterns.borrow_mut().apply(&request).map_err(mlua::Error::external)
        })?,
    )?;

    let modules = Rc::clone(session);
    globals.set(
        "use",
        lua.create_function(move |lua, name: String| {
            super::use_module(lua, &modules, &name).map_err(mlua::Error::external)
        })?,
    )?;

    let info = lua.create_table()?;
    info.set("version", env!("CARGO_PKG_VERSION"))?;
    info.set("path", session.input_path.as_ref().map(|path| path.display().to_string()))?;
    info.set(
        "dirs",
        session.search_path.dirs().iter().map(|dir| dir.display().to_string()).collect::<Vec<_>>(),
    )?;
    globals.set("pprb", info)?;

    Ok(())
}

/// `nil` writes nothing; strings are written as-is, with bytes that are
/// not UTF-8 replaced by U+FFFD; anything else goes through Lua's own
/// `tostring`.
fn stringify(lua: &Lua, value: Value) -> mlua::Result<String> {
    match value {
        Value::Nil => Ok(String::new()),
        Value::String(text) => Ok(text.to_string_lossy().into()),
        other => {
            let tostring: Function = lua.globals().get("tostring")?;
            tostring.call::<String>(other)
        }
    }
}

/// Interpret `profile(first, second)` arguments.
fn profile_request(first: Value, second: Option<Value>) -> Result<ProfileRequest, PreprocessError> {
    let mut request = ProfileRequest::default();

    match first {
        Value::Nil => {}
        Value::String(name) => {
            let name: String = name.to_string_lossy().into();
            request.profile = Some(name.parse()?);
        }
        Value::Table(table) => request.overlay = Some(overlay_from_table(&table)?),
        other => {
            return Err(PreprocessError::Configuration {
                message: format!(
                    "expected a profile name or an overlay table, found {}",
                    other.type_name()
                ),
            });
        }
    }

    match second {
        None | Some(Value::Nil) => {}
        Some(Value::Table(table)) if request.overlay.is_none() => {
            request.overlay = Some(overlay_from_table(&table)?);
        }
        Some(other) => {
            return Err(PreprocessError::Configuration {
                message: format!("expected an overlay table, found {}", other.type_name()),
            });
        }
    }

    if request.is_empty() {
        return Err(PreprocessError::MissingProfileOrOverlay);
    }
    Ok(request)
}

fn overlay_from_table(table: &Table) -> Result<Overlay, PreprocessError> {
    let mut overlay = Overlay::new();
    for pair in table.pairs::<Value, Value>() {
        let (key, value) = pair.map_err(|e| PreprocessError::Configuration {
            message: e.to_string(),
        })?;

        let key: String = match key {
            Value::String(key) => key.to_string_lossy().into(),
            other => {
                return Err(PreprocessError::UnknownOption {
                    key: format!("<{}>", other.type_name()),
                    similar: Vec::new(),
                });
            }
        };

        let pattern: String = match value {
            Value::String(pattern) => pattern.to_string_lossy().into(),
            other => {
                return Err(PreprocessError::InvalidOptionValue {
                    key,
                    reason: format!("expected a pattern string, found {}", other.type_name()),
                });
            }
        };

        overlay.insert(&key, &pattern)?;
    }
    Ok(overlay)
}
