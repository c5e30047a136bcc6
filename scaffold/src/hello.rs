// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The `hello` command.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::{
    config::ConfigObject,
    error::{self, Error},
    resolve::resolve_string
};

/// Configuration section read by the command.
pub const HELLO_SECTION: &str = "hello";

const DEFAULT_NAME: &str = "world";

/// Options handed to the greeting action after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HelloOptions {
    /// Global verbose flag.
    pub verbose: bool,
    /// Global debug flag; prints the resolved inputs.
    pub debug:   bool,
    /// Global quiet flag; suppresses the greeting.
    pub quiet:   bool,
    /// Title placed before the name.
    pub title:   String
}

/// Resolved command input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelloInput {
    /// Name to greet.
    pub name:    String,
    /// Resolved options.
    pub options: HelloOptions
}

/// Resolves the command arguments against the cascaded configuration.
///
/// The name falls back to `hello.name` and then `"world"`; the title falls
/// back to `hello.title` and then an empty string. Global flags are read
/// from the `globals` section.
pub fn resolve_hello(name: Option<&str>, title: Option<&str>, config: &ConfigObject) -> HelloInput {
    let section = config.get(HELLO_SECTION);
    let configured = |key: &str| section.and_then(|section| section.get(key));
    let global = |key: &str| {
        config
            .get("globals")
            .and_then(|globals| globals.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    HelloInput {
        name:    resolve_string(name, configured("name"), DEFAULT_NAME),
        options: HelloOptions {
            verbose: global("verbose"),
            debug:   global("debug"),
            quiet:   global("quiet"),
            title:   resolve_string(title, configured("title"), "")
        }
    }
}

/// Formats the greeting, omitting an empty title.
pub fn greeting(title: &str, name: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        format!("Hello, {name}!")
    } else {
        format!("Hello, {title} {name}!")
    }
}

/// Writes the command output for `input`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the writer fails and [`Error::Serialize`] when
/// the debug dump cannot be encoded.
pub fn run_hello<W: Write>(writer: &mut W, input: &HelloInput) -> Result<(), Error> {
    let stdout = std::path::Path::new("<stdout>");
    if input.options.debug {
        let dump = serde_json::to_string(input)?;
        writeln!(writer, "Debug info: {dump}").map_err(|source| error::io_error(stdout, source))?;
    }
    if !input.options.quiet {
        writeln!(writer, "{}", greeting(&input.options.title, &input.name))
            .map_err(|source| error::io_error(stdout, source))?;
    }
    Ok(())
}
