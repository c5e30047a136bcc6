// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Three-tier value precedence used by command handlers.
//!
//! Values supplied on the command line win over values from the cascaded
//! configuration, which in turn win over the hardcoded fallback. Only absence
//! moves resolution to the next tier: zero, empty strings and `false` are
//! present values.

use serde_json::Value;

/// Returns the first present value of `explicit`, `configured` and
/// `fallback`.
///
/// # Examples
///
/// ```
/// use scaffold::resolve;
///
/// assert_eq!(resolve(Some(0), Some(7), 9), 0);
/// assert_eq!(resolve(None, Some(7), 9), 7);
/// assert_eq!(resolve::<i32>(None, None, 9), 9);
/// ```
pub fn resolve<T>(explicit: Option<T>, configured: Option<T>, fallback: T) -> T {
    explicit.or(configured).unwrap_or(fallback)
}

/// Treats JSON `null` as an absent configuration value.
///
/// Configuration documents are dynamic, so a key explicitly set to `null`
/// must fall through to the next tier exactly like a missing key.
pub fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|candidate| !candidate.is_null())
}

/// Resolves a string value where the configured tier comes from a dynamic
/// configuration document.
///
/// Non-string configured scalars (numbers, booleans) are rendered with their
/// JSON representation so that `0` or `false` remain present values.
pub fn resolve_string(
    explicit: Option<&str>,
    configured: Option<&Value>,
    fallback: &str
) -> String {
    let configured = present(configured).map(|value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string()
    });
    resolve(explicit.map(str::to_owned), configured, fallback.to_owned())
}
