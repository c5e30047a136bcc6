// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Explicit process context shared by the loader and the transforms.
//!
//! Components never consult the process working directory or environment on
//! their own; the CLI captures both once and threads a [`WorkingContext`]
//! through every call.

use std::{
    env,
    path::{Path, PathBuf}
};

use crate::error::{self, Error};

/// Environment variable overriding the bundled default configuration path.
pub const DEFAULT_CONFIG_ENV: &str = "SCAFFOLD_DEFAULT_CONFIG";

/// Relative location of the bundled default configuration file.
const BUNDLED_DEFAULT_CONFIG: &str = "config/default.config.yaml";

/// Ambient state for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    /// Directory that relative paths and discovery start from.
    pub cwd:            PathBuf,
    /// Location of the bundled default configuration, if one is known.
    pub default_config: Option<PathBuf>
}

impl WorkingContext {
    /// Creates a context rooted at `cwd` without a bundled default.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd:            cwd.into(),
            default_config: None
        }
    }

    /// Replaces the bundled default configuration location.
    pub fn with_default_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_config = Some(path.into());
        self
    }

    /// Captures the context of the running process.
    ///
    /// The bundled default is taken from [`DEFAULT_CONFIG_ENV`] when set,
    /// otherwise from `config/default.config.yaml` next to the executable and
    /// finally from the crate source tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the current directory cannot be determined.
    pub fn from_process() -> Result<Self, Error> {
        let cwd = env::current_dir().map_err(|source| error::io_error(Path::new("."), source))?;
        let default_config = env::var_os(DEFAULT_CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(bundled_default_config);

        Ok(Self {
            cwd,
            default_config
        })
    }

    /// Resolves `path` against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

fn bundled_default_config() -> Option<PathBuf> {
    let beside_executable = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_DEFAULT_CONFIG)));
    let source_tree = Path::new(env!("CARGO_MANIFEST_DIR")).join(BUNDLED_DEFAULT_CONFIG);

    beside_executable
        .into_iter()
        .chain(std::iter::once(source_tree))
        .find(|candidate| candidate.is_file())
}
