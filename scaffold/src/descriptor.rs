// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Project descriptor read from `package.json`.
//!
//! The descriptor is an immutable input shared by the badge and
//! acknowledgment transforms. Every field is optional: transforms degrade to
//! shorter output rather than failing when information is missing.

use std::{collections::BTreeMap, fs, path::Path, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::{
    context::WorkingContext,
    error::{self, Error}
};

/// File name of the project descriptor inside the working directory.
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Subset of `package.json` consumed by the transforms.
///
/// # Examples
///
/// ```
/// use scaffold::ProjectDescriptor;
///
/// let descriptor: ProjectDescriptor = serde_json::from_str(
///     r#"{"name":"pkg","repository":{"type":"git","url":"git+https://github.com/o/r.git"}}"#,
/// )
/// .expect("valid descriptor");
/// let coordinates = descriptor.repo_coordinates().expect("github repository");
/// assert_eq!(coordinates.slug(), "o/r");
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    /// Published package name.
    #[serde(default)]
    pub name:              Option<String>,
    /// Package version.
    #[serde(default)]
    pub version:           Option<String>,
    /// SPDX license expression.
    #[serde(default, deserialize_with = "lenient_license")]
    pub license:           Option<String>,
    /// Source repository reference; unusable shapes read as `None`.
    #[serde(default, deserialize_with = "lenient_repository")]
    pub repository:        Option<Repository>,
    /// One-line package description.
    #[serde(default)]
    pub description:       Option<String>,
    /// Runtime dependencies keyed by name.
    #[serde(default)]
    pub dependencies:      BTreeMap<String, String>,
    /// Development dependencies keyed by name.
    #[serde(default)]
    pub dev_dependencies:  BTreeMap<String, String>,
    /// Workflow file used by the CI status badge.
    #[serde(default, alias = "workflowFile")]
    pub ci_workflow:       Option<String>,
    /// Branch used by the CI status and coverage badges.
    #[serde(default, alias = "workflowBranch")]
    pub ci_branch:         Option<String>
}

/// Repository field, either a bare string or an object with a `url`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Repository {
    /// `"repository": "github:owner/repo"`
    Url(String),
    /// `"repository": { "type": "git", "url": "..." }`
    Object {
        /// Repository URL.
        url: String
    }
}

impl Repository {
    /// Returns the raw repository URL.
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Object {
                url
            } => url
        }
    }
}

/// Owner and repository name on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    /// Account owning the repository.
    pub owner: String,
    /// Repository name.
    pub repo:  String
}

impl RepoCoordinates {
    /// Formats the coordinates as `owner/repo`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl ProjectDescriptor {
    /// Loads `package.json` from the working directory.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file exists but cannot be read and
    /// [`Error::Validation`] when it is not a valid descriptor.
    pub fn load(context: &WorkingContext) -> Result<Option<Self>, Error> {
        let path = context.cwd.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            debug!("no descriptor at {}", path.display());
            return Ok(None);
        }
        Self::from_path(&path).map(Some)
    }

    /// Reads a descriptor from an explicit path.
    ///
    /// # Errors
    ///
    /// See [`ProjectDescriptor::load`].
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| error::io_error(path, source))?;
        serde_json::from_str(&contents).map_err(|source| {
            Error::validation(format!("invalid descriptor {}: {source}", path.display()))
        })
    }

    /// Parses the repository field into hosting coordinates.
    pub fn repo_coordinates(&self) -> Option<RepoCoordinates> {
        self.repository.as_ref().and_then(|repository| parse_repository(repository.url()))
    }
}

fn lenient_repository<'de, D>(deserializer: D) -> Result<Option<Repository>, D::Error>
where
    D: Deserializer<'de>
{
    let value = Value::deserialize(deserializer)?;
    let repository = serde_json::from_value::<Repository>(value).ok();
    if repository.is_none() {
        debug!("repository field has no usable url");
    }
    Ok(repository)
}

/// Accepts an SPDX string or the legacy `{ "type": "MIT" }` object.
fn lenient_license<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>
{
    let license = match Value::deserialize(deserializer)? {
        Value::String(license) => Some(license),
        Value::Object(mut object) => match object.remove("type") {
            Some(Value::String(license)) => Some(license),
            _ => None
        },
        _ => None
    };
    Ok(license)
}

/// Extracts `owner/repo` from a GitHub repository reference.
///
/// Accepted forms are host-qualified URLs (`https://github.com/o/r`,
/// `git+https://github.com/o/r.git`, `git://github.com/o/r.git`,
/// `ssh://git@github.com/o/r`), SCP-style addresses (`git@github.com:o/r.git`)
/// and the `github:o/r` shorthand. Anything else yields `None`.
pub fn parse_repository(raw: &str) -> Option<RepoCoordinates> {
    static HOST_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = HOST_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:github\.com[:/]|^github:)([^/\s]+)/([^/\s#?]+)")
            .expect("repository pattern is valid")
    });

    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix("git+").unwrap_or(trimmed);
    let stripped = stripped.trim_end_matches('/');
    let stripped = stripped.strip_suffix(".git").unwrap_or(stripped);

    let captures = pattern.captures(stripped)?;
    let owner = captures.get(1)?.as_str();
    let repo = captures.get(2)?.as_str();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some(RepoCoordinates {
        owner: owner.to_owned(),
        repo:  repo.to_owned()
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn coordinates(raw: &str) -> Option<String> {
        parse_repository(raw).map(|coords| coords.slug())
    }

    #[test]
    fn parses_git_plus_https_url() {
        assert_eq!(
            coordinates("git+https://github.com/octo/tool.git").as_deref(),
            Some("octo/tool")
        );
    }

    #[test]
    fn parses_scp_style_address() {
        assert_eq!(coordinates("git@github.com:octo/tool.git").as_deref(), Some("octo/tool"));
    }

    #[test]
    fn parses_shorthand_and_trailing_slash() {
        assert_eq!(coordinates("github:octo/tool").as_deref(), Some("octo/tool"));
        assert_eq!(coordinates("https://github.com/octo/tool/").as_deref(), Some("octo/tool"));
    }

    #[test]
    fn ignores_extra_path_segments() {
        assert_eq!(
            coordinates("https://github.com/octo/tool/tree/main/packages/a").as_deref(),
            Some("octo/tool")
        );
    }

    #[test]
    fn rejects_unrecognized_hosts() {
        assert!(coordinates("https://gitlab.com/octo/tool.git").is_none());
        assert!(coordinates("not a url").is_none());
        assert!(coordinates("https://github.com/octo").is_none());
    }

    #[test]
    fn repository_object_form_is_supported() {
        let descriptor: ProjectDescriptor = serde_json::from_str(
            r#"{"repository":{"type":"git","url":"https://github.com/a/b.git"}}"#
        )
        .expect("descriptor should parse");
        assert_eq!(descriptor.repo_coordinates().map(|c| c.slug()).as_deref(), Some("a/b"));
    }

    #[test]
    fn repository_without_url_reads_as_absent() {
        let descriptor: ProjectDescriptor = serde_json::from_str(
            r#"{"name":"pkg","repository":{"type":"git","directory":"packages/x"}}"#
        )
        .expect("descriptor should parse");
        assert!(descriptor.repository.is_none());
        assert_eq!(descriptor.name.as_deref(), Some("pkg"));

        let descriptor: ProjectDescriptor =
            serde_json::from_str(r#"{"repository":42}"#).expect("descriptor should parse");
        assert!(descriptor.repo_coordinates().is_none());
    }

    #[test]
    fn legacy_license_object_is_accepted() {
        let descriptor: ProjectDescriptor =
            serde_json::from_str(r#"{"license":{"type":"MIT","url":"https://opensource.org"}}"#)
                .expect("descriptor should parse");
        assert_eq!(descriptor.license.as_deref(), Some("MIT"));
    }

    #[test]
    fn dependencies_and_overrides_are_read() {
        let descriptor: ProjectDescriptor = serde_json::from_str(
            r#"{
                "name": "pkg",
                "dependencies": { "left-pad": "^1.0.0" },
                "devDependencies": { "jest": "^29.0.0" },
                "ciWorkflow": "test.yml",
                "workflowBranch": "develop"
            }"#
        )
        .expect("descriptor should parse");

        assert_eq!(descriptor.dependencies.len(), 1);
        assert!(descriptor.dev_dependencies.contains_key("jest"));
        assert_eq!(descriptor.ci_workflow.as_deref(), Some("test.yml"));
        assert_eq!(descriptor.ci_branch.as_deref(), Some("develop"));
    }

    #[test]
    fn load_returns_none_without_package_json() {
        let directory = tempdir().expect("failed to create temp dir");
        let context = WorkingContext::new(directory.path());
        assert!(ProjectDescriptor::load(&context).expect("load should succeed").is_none());
    }

    #[test]
    fn load_reports_invalid_descriptor() {
        let directory = tempdir().expect("failed to create temp dir");
        std::fs::write(directory.path().join(DESCRIPTOR_FILE), "{ nope")
            .expect("failed to write descriptor");
        let context = WorkingContext::new(directory.path());

        let error = ProjectDescriptor::load(&context).expect_err("invalid descriptor must fail");
        assert!(matches!(error, Error::Validation { .. }));
    }
}
