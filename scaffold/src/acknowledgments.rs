// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Dependency acknowledgments for the `ACKNOWLEDGMENTS` transform.
//!
//! Declared dependencies are listed as markdown bullets linking to their
//! registry pages. Optionally, dependencies that are never referenced from
//! project sources are dropped, and well-known tools are highlighted.

use std::{collections::BTreeMap, fs};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    config::ConfigObject,
    context::WorkingContext,
    descriptor::{DESCRIPTOR_FILE, ProjectDescriptor},
    error::Error,
    options::{OptionMap, resolve_options},
    scan::{FileScanner, ScannedFile}
};

/// Name of the transform in documentation directives.
pub const ACKNOWLEDGMENTS_TRANSFORM: &str = "ACKNOWLEDGMENTS";

/// Placeholder used when a dependency's own descriptor cannot be read.
pub const NO_DESCRIPTION: &str = "No description available";

const NONE_USED_NOTICE: &str =
    "_None of the declared dependencies are referenced in the project sources._";

const REGISTRY_URL: &str = "https://www.npmjs.com/package";

/// Tool names highlighted when no allow-list is configured.
const DEFAULT_IMPORTANT: &[&str] = &[
    "express",
    "webpack",
    "rollup",
    "vite",
    "esbuild",
    "parcel",
    "typescript",
    "jest",
    "eslint",
    "prettier"
];

/// Options accepted by the `ACKNOWLEDGMENTS` transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgmentOptions {
    /// Includes development dependencies.
    pub include_dev:         bool,
    /// Drops dependencies not referenced from project sources.
    pub evaluate_used:       bool,
    /// Highlights dependencies listed in `important_packages`.
    pub highlight_important: bool,
    /// Case-insensitive allow-list of highlighted dependency names.
    pub important_packages:  Vec<String>
}

impl Default for AcknowledgmentOptions {
    fn default() -> Self {
        Self {
            include_dev:         true,
            evaluate_used:       false,
            highlight_important: false,
            important_packages:  DEFAULT_IMPORTANT.iter().map(|name| (*name).to_owned()).collect()
        }
    }
}

/// A dependency credited in the acknowledgments list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Package name.
    pub name:        String,
    /// Description taken from the installed package descriptor.
    pub description: String,
    /// Whether the name is in the highlighted allow-list.
    pub important:   bool
}

impl DependencyEntry {
    fn to_markdown(&self) -> String {
        let link = format!("[{}]({REGISTRY_URL}/{})", self.name, self.name);
        if self.important {
            format!("- ⭐ {link} - **{}**", self.description)
        } else {
            format!("- {link} - {}", self.description)
        }
    }
}

/// Outcome of the acknowledgments transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgments {
    /// The descriptor declares no (selected) dependencies.
    NoDependencies,
    /// Dependencies are declared but the usage scan found none of them.
    NoneUsed,
    /// Dependencies to credit, sorted case-insensitively.
    Listed(Vec<DependencyEntry>)
}

impl Acknowledgments {
    /// Renders the outcome as markdown.
    ///
    /// [`Acknowledgments::NoDependencies`] renders as an empty string while
    /// [`Acknowledgments::NoneUsed`] renders a short notice.
    pub fn to_markdown(&self) -> String {
        match self {
            Self::NoDependencies => String::new(),
            Self::NoneUsed => NONE_USED_NOTICE.to_owned(),
            Self::Listed(entries) => {
                entries.iter().map(DependencyEntry::to_markdown).collect::<Vec<_>>().join("\n")
            }
        }
    }
}

/// Runs the `ACKNOWLEDGMENTS` transform for the project in the working
/// directory.
///
/// A missing `package.json` yields an empty string.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the descriptor or the merged options are
/// invalid, and [`Error::Io`] when the descriptor cannot be read.
pub fn acknowledgments_transform(
    context: &WorkingContext,
    settings: &ConfigObject,
    invocation: &OptionMap,
    scanner: &dyn FileScanner
) -> Result<String, Error> {
    let Some(descriptor) = ProjectDescriptor::load(context)? else {
        return Ok(String::new());
    };
    let options = resolve_options(
        &AcknowledgmentOptions::default(),
        settings,
        ACKNOWLEDGMENTS_TRANSFORM,
        invocation
    )?;
    Ok(render_acknowledgments(context, &descriptor, &options, scanner).to_markdown())
}

/// Builds the acknowledgments for `descriptor`.
pub fn render_acknowledgments(
    context: &WorkingContext,
    descriptor: &ProjectDescriptor,
    options: &AcknowledgmentOptions,
    scanner: &dyn FileScanner
) -> Acknowledgments {
    let mut names = declared_dependencies(descriptor, options.include_dev);
    if names.is_empty() {
        return Acknowledgments::NoDependencies;
    }

    if options.evaluate_used {
        let files = scanner.scan(&context.cwd);
        debug!("checking {} dependencies against {} files", names.len(), files.len());
        names.retain(|name| is_used(name, &files));
        if names.is_empty() {
            info!("no declared dependency is referenced from project sources");
            return Acknowledgments::NoneUsed;
        }
    }

    let entries = names
        .into_iter()
        .map(|name| DependencyEntry {
            description: read_description(context, &name),
            important: options.highlight_important
                && is_important(&name, &options.important_packages),
            name
        })
        .collect();

    Acknowledgments::Listed(entries)
}

/// Returns dependency names sorted case-insensitively.
fn declared_dependencies(descriptor: &ProjectDescriptor, include_dev: bool) -> Vec<String> {
    let mut merged: BTreeMap<&str, &str> = descriptor
        .dependencies
        .iter()
        .map(|(name, range)| (name.as_str(), range.as_str()))
        .collect();
    if include_dev {
        for (name, range) in &descriptor.dev_dependencies {
            merged.entry(name.as_str()).or_insert(range.as_str());
        }
    }

    let mut names: Vec<String> = merged.into_keys().map(str::to_owned).collect();
    names.sort_by(|left, right| {
        left.to_lowercase().cmp(&right.to_lowercase()).then_with(|| left.cmp(right))
    });
    names
}

fn is_used(name: &str, files: &[ScannedFile]) -> bool {
    let patterns = usage_patterns(name);
    files
        .iter()
        .any(|file| patterns.iter().any(|pattern| pattern.is_match(&file.contents)))
}

/// Builds the textual checks proving that `name` is referenced.
///
/// The battery is, in order: a quoted module reference to the full name
/// (optionally followed by a subpath), a quoted reference to its final path
/// segment for scoped names, and a plain word-boundary match.
fn usage_patterns(name: &str) -> Vec<Regex> {
    let quoted = |target: &str| format!(r#"['"`]{}(?:/[^'"`]*)?['"`]"#, regex::escape(target));

    let mut sources = vec![quoted(name)];
    if let Some((_, segment)) = name.rsplit_once('/')
        && !segment.is_empty()
    {
        sources.push(quoted(segment));
    }
    sources.push(word_pattern(name));

    sources.iter().filter_map(|source| Regex::new(source).ok()).collect()
}

fn word_pattern(name: &str) -> String {
    let is_word =
        |character: Option<char>| character.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let leading = if is_word(name.chars().next()) { r"\b" } else { "" };
    let trailing = if is_word(name.chars().last()) { r"\b" } else { "" };
    format!("{leading}{}{trailing}", regex::escape(name))
}

fn is_important(name: &str, allow_list: &[String]) -> bool {
    allow_list.iter().any(|candidate| candidate.eq_ignore_ascii_case(name))
}

fn read_description(context: &WorkingContext, name: &str) -> String {
    let path = context.cwd.join("node_modules").join(name).join(DESCRIPTOR_FILE);
    let description = fs::read_to_string(&path)
        .ok()
        .and_then(|contents| serde_json::from_str::<Value>(&contents).ok())
        .and_then(|manifest| Some(manifest.get("description")?.as_str()?.trim().to_owned()))
        .filter(|text| !text.is_empty());

    description.unwrap_or_else(|| {
        debug!("no description for {name} at {}", path.display());
        NO_DESCRIPTION.to_owned()
    })
}
