// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Splices transform output into markdown documents.
//!
//! Generated regions are delimited by HTML comments naming the transform and
//! its inline options:
//!
//! ```markdown
//! <!-- doc-gen BADGES style=flat-square collapse=true -->
//! generated content
//! <!-- end-doc-gen -->
//! ```
//!
//! Everything between the markers is replaced on every run; everything
//! outside is preserved byte for byte.

use std::{fs, path::Path, sync::OnceLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    acknowledgments::{ACKNOWLEDGMENTS_TRANSFORM, acknowledgments_transform},
    badges::{BADGES_TRANSFORM, badges_transform},
    config::ConfigObject,
    context::WorkingContext,
    error::{self, Error},
    options::OptionMap,
    scan::FileScanner
};

/// Closing marker of a generated region.
pub const END_MARKER: &str = "<!-- end-doc-gen -->";

/// Parsed opening marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Transform name, e.g. `BADGES`.
    pub transform: String,
    /// Inline `key=value` options.
    pub options:   OptionMap
}

/// Runs transforms against one project and rewrites documents.
pub struct DocGenerator<'a> {
    context:  &'a WorkingContext,
    settings: &'a ConfigObject,
    scanner:  &'a dyn FileScanner
}

impl<'a> DocGenerator<'a> {
    /// Creates a generator for the project in `context`.
    ///
    /// `settings` is the loaded configuration; its `transformDefaults`
    /// section supplies caller-wide transform options.
    pub fn new(
        context: &'a WorkingContext,
        settings: &'a ConfigObject,
        scanner: &'a dyn FileScanner
    ) -> Self {
        Self {
            context,
            settings,
            scanner
        }
    }

    /// Runs the named transform, returning `None` for unknown transforms.
    ///
    /// # Errors
    ///
    /// Propagates descriptor and option errors from the transform.
    pub fn run(&self, directive: &Directive) -> Result<Option<String>, Error> {
        let output = match directive.transform.as_str() {
            BADGES_TRANSFORM => badges_transform(self.context, self.settings, &directive.options)?,
            ACKNOWLEDGMENTS_TRANSFORM => acknowledgments_transform(
                self.context,
                self.settings,
                &directive.options,
                self.scanner
            )?,
            _ => return Ok(None)
        };
        Ok(Some(output))
    }

    /// Replaces every generated region in `content`.
    ///
    /// Regions naming an unknown transform are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a directive is malformed or has no
    /// closing marker, and propagates transform errors.
    pub fn process(&self, content: &str) -> Result<String, Error> {
        let mut output = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(open) = start_pattern().find(rest) {
            let header_len = rest[open.end()..]
                .find("-->")
                .ok_or_else(|| Error::validation("unterminated doc-gen directive"))?;
            let header_end = open.end() + header_len + "-->".len();
            let directive = parse_directive(&rest[open.end()..open.end() + header_len])?;

            let close = end_pattern().find(&rest[header_end..]).ok_or_else(|| {
                Error::validation(format!(
                    "missing {END_MARKER} for {} directive",
                    directive.transform
                ))
            })?;
            let body_end = header_end + close.start();

            output.push_str(&rest[..header_end]);
            match self.run(&directive)? {
                Some(generated) => {
                    debug!("rendered {} ({} bytes)", directive.transform, generated.len());
                    output.push('\n');
                    if !generated.is_empty() {
                        output.push_str(&generated);
                        output.push('\n');
                    }
                }
                None => {
                    warn!("unknown transform {}, leaving region untouched", directive.transform);
                    output.push_str(&rest[header_end..body_end]);
                }
            }
            output.push_str(END_MARKER);
            rest = &rest[header_end + close.end()..];
        }

        output.push_str(rest);
        Ok(output)
    }

    /// Regenerates the regions of the file at `path`.
    ///
    /// Returns `true` when the content changed. The file is written only when
    /// it changed and `check` is `false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read,
    /// [`Error::Readme`] when it cannot be written, and propagates
    /// [`DocGenerator::process`] errors.
    pub fn update_file(&self, path: &Path, check: bool) -> Result<bool, Error> {
        info!("Reading {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| error::io_error(path, source))?;

        let updated = self.process(&content)?;
        if updated == content {
            info!("No changes to {}", path.display());
            return Ok(false);
        }

        if check {
            info!("{} is out of date", path.display());
        } else {
            info!("Writing updated {}", path.display());
            fs::write(path, updated).map_err(|source| error::readme_error(path, source))?;
        }
        Ok(true)
    }
}

fn start_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<!--\s*doc-gen\b").expect("start pattern is valid"))
}

fn end_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<!--\s*end-doc-gen\s*-->").expect("end pattern is valid"))
}

/// Parses the text between `doc-gen` and `-->` of an opening marker.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the transform name is missing, a token
/// is not `key=value`, or a quote is unterminated.
///
/// # Examples
///
/// ```
/// use scaffold::parse_directive;
///
/// let directive = parse_directive(" BADGES collapse=true collapseVisible=2 ")?;
/// assert_eq!(directive.transform, "BADGES");
/// assert_eq!(directive.options["collapse"], true);
/// assert_eq!(directive.options["collapseVisible"], 2);
/// # Ok::<(), scaffold::Error>(())
/// ```
pub fn parse_directive(header: &str) -> Result<Directive, Error> {
    let mut tokens = tokenize(header)?.into_iter();
    let transform = tokens
        .next()
        .ok_or_else(|| Error::validation("doc-gen directive is missing a transform name"))?;

    let mut options = OptionMap::new();
    for token in tokens {
        let (key, raw) = token
            .split_once('=')
            .ok_or_else(|| Error::validation(format!("expected key=value, found '{token}'")))?;
        options.insert(key.to_owned(), parse_value(raw));
    }

    Ok(Directive {
        transform,
        options
    })
}

/// Splits on whitespace, keeping quoted sections together.
///
/// Quotes are kept in the token so that [`parse_value`] can tell quoted
/// strings from bare literals.
fn tokenize(input: &str) -> Result<Vec<String>, Error> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for character in input.chars() {
        match quote {
            Some(open) => {
                current.push(character);
                if character == open {
                    quote = None;
                }
            }
            None if character.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => {
                if matches!(character, '"' | '\'') {
                    quote = Some(character);
                }
                current.push(character);
            }
        }
    }

    if quote.is_some() {
        return Err(Error::validation(format!("unterminated quote in directive: {input}")));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Interprets an inline option value.
///
/// `true`/`false` become booleans, integers become numbers, `null` is null,
/// quoted text becomes a string without its quotes, `[a,b]` becomes an array
/// of interpreted items and anything else is kept as a string.
fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if let Ok(number) = raw.parse::<i64>() {
        return Value::from(number);
    }

    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::String(raw[1..raw.len() - 1].to_owned());
        }
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_value)
            .collect();
        return Value::Array(items);
    }

    Value::String(raw.to_owned())
}
