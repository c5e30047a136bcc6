#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the scaffold crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Only user input failures travel through this type. Best-effort lookups
//! (dependency descriptors, repository URLs, directory walks) degrade inside
//! their components and never surface here.

use std::path::{Path, PathBuf};

/// Unified error type returned by the configuration loader, the
/// documentation host and the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading input files.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Location of the file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Returned when the inline `--config` JSON cannot be decoded.
    #[error("invalid JSON passed to --config: {input}: {source}")]
    InlineConfig {
        /// The malformed inline document as supplied by the user.
        input:  String,
        /// Decoding error reported by serde_json.
        source: serde_json::Error
    },
    /// Returned when an explicit configuration path does not exist.
    #[error("config file not found: {path:?}")]
    ConfigNotFound {
        /// Resolved location of the missing file.
        path: PathBuf
    },
    /// Returned when an explicit configuration file exists but cannot be
    /// loaded.
    #[error("failed to load config file {path:?}: {message}")]
    ConfigLoad {
        /// Resolved location of the configuration file.
        path:    PathBuf,
        /// Human readable description of the failure.
        message: String
    },
    /// Returned when input violates invariants.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps serialization errors when writing structured output.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while rewriting documentation files.
    #[error("failed to write documentation file {path:?}: {source}")]
    Readme {
        /// Location of the documentation file.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a configuration load error for the provided path.
    pub fn config_load<M>(path: &Path, message: M) -> Self
    where
        M: Into<String>
    {
        Self::ConfigLoad {
            path:    path.to_path_buf(),
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::Readme`] variant capturing the failing path and source.
pub fn readme_error(path: &Path, source: std::io::Error) -> Error {
    Error::Readme {
        path: path.to_path_buf(),
        source
    }
}
