// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Layered option merging for documentation transforms.
//!
//! Options are merged from three layers, each overriding the previous one:
//! the transform's built-in defaults, caller-wide defaults stored under
//! `transformDefaults.<TRANSFORM>` in the loaded configuration, and the
//! options written on the invocation itself. `null` values never override a
//! lower layer.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::Error;

/// Untyped option layer.
pub type OptionMap = Map<String, Value>;

/// Configuration key holding per-transform defaults.
pub const TRANSFORM_DEFAULTS_KEY: &str = "transformDefaults";

/// Returns the caller-wide defaults registered for `transform`.
///
/// Missing or non-object sections yield an empty layer.
pub fn transform_defaults(settings: &Map<String, Value>, transform: &str) -> OptionMap {
    settings
        .get(TRANSFORM_DEFAULTS_KEY)
        .and_then(|defaults| defaults.get(transform))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Shallow-merges `layers` in order; later layers win on key collision.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a OptionMap>) -> OptionMap {
    let mut merged = OptionMap::new();
    for layer in layers {
        for (key, value) in layer {
            if !value.is_null() {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Merges the three option layers and decodes the result into `T`.
///
/// `builtin` supplies the lowest layer and is serialized before merging, so
/// any field absent from the upper layers keeps its built-in value.
///
/// # Errors
///
/// Returns [`Error::Validation`] when a merged value has the wrong type.
///
/// # Examples
///
/// ```
/// use scaffold::{BadgeOptions, OptionMap, resolve_options};
///
/// let mut invocation = OptionMap::new();
/// invocation.insert("collapse".to_owned(), true.into());
/// let options: BadgeOptions =
///     resolve_options(&BadgeOptions::default(), &OptionMap::new(), "BADGES", &invocation)?;
/// assert!(options.collapse);
/// assert_eq!(options.collapse_visible, 3);
/// # Ok::<(), scaffold::Error>(())
/// ```
pub fn resolve_options<T>(
    builtin: &T,
    settings: &Map<String, Value>,
    transform: &str,
    invocation: &OptionMap
) -> Result<T, Error>
where
    T: Serialize + DeserializeOwned
{
    let builtin = match serde_json::to_value(builtin)? {
        Value::Object(map) => map,
        _ => OptionMap::new()
    };
    let global = transform_defaults(settings, transform);
    let merged = merge_layers([&builtin, &global, invocation]);

    serde_json::from_value(Value::Object(merged))
        .map_err(|error| Error::validation(format!("invalid {transform} options: {error}")))
}
