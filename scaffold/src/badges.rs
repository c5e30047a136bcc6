// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Markdown badge generation for the `BADGES` transform.
//!
//! Badges are produced in a fixed order from the project descriptor: package
//! name, version and license first, followed by repository-hosted badges when
//! the repository field resolves to GitHub coordinates. Rendering optionally
//! collapses secondary badges into a `<details>` disclosure element while a
//! priority subset stays inline.

use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::ConfigObject,
    context::WorkingContext,
    descriptor::{ProjectDescriptor, RepoCoordinates},
    error::Error,
    options::{OptionMap, resolve_options}
};

/// Name of the transform in documentation directives.
pub const BADGES_TRANSFORM: &str = "BADGES";

/// Keys kept inline first when collapsing, in preference order.
const PREFERRED_VISIBLE: [&str; 4] = ["npmVersion", "actions", "license", "maintained"];

const SHIELDS: &str = "https://img.shields.io";

/// Rendering options accepted by the `BADGES` transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeOptions {
    /// Badge style forwarded to the image service (e.g. `flat-square`).
    pub style:            Option<String>,
    /// Collapses secondary badges into a disclosure element.
    pub collapse:         bool,
    /// Summary text of the disclosure element.
    pub collapse_label:   String,
    /// Number of badges kept inline when collapsing.
    pub collapse_visible: usize,
    /// Workflow file used by the CI status badge.
    pub ci_workflow:      String,
    /// Branch used by the CI status and coverage badges.
    pub ci_branch:        String
}

impl Default for BadgeOptions {
    fn default() -> Self {
        Self {
            style:            None,
            collapse:         false,
            collapse_label:   "More badges".to_owned(),
            collapse_visible: 3,
            ci_workflow:      "ci.yml".to_owned(),
            ci_branch:        "main".to_owned()
        }
    }
}

impl BadgeOptions {
    /// Built-in defaults with the descriptor's workflow overrides applied.
    pub fn builtin_for(descriptor: &ProjectDescriptor) -> Self {
        let defaults = Self::default();
        Self {
            ci_workflow: descriptor.ci_workflow.clone().unwrap_or(defaults.ci_workflow),
            ci_branch: descriptor.ci_branch.clone().unwrap_or(defaults.ci_branch),
            ..Self::default()
        }
    }
}

/// A single rendered badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeEntry {
    /// Identifier unique within one invocation.
    pub key:   &'static str,
    /// Alternative text of the image.
    pub alt:   String,
    /// Image URL, including the style parameter when one is set.
    pub image: String,
    /// Link target, absent for bare images.
    pub link:  Option<String>
}

impl BadgeEntry {
    fn linked(key: &'static str, alt: &str, image: String, link: String) -> Self {
        Self {
            key,
            alt: alt.to_owned(),
            image,
            link: Some(link)
        }
    }

    fn bare(key: &'static str, alt: &str, image: String) -> Self {
        Self {
            key,
            alt: alt.to_owned(),
            image,
            link: None
        }
    }

    /// Renders `[![alt](image)](link)` or `![alt](image)`.
    pub fn to_markdown(&self) -> String {
        match self.link.as_deref() {
            Some(link) => format!("[![{}]({})]({})", self.alt, self.image, link),
            None => format!("![{}]({})", self.alt, self.image)
        }
    }
}

/// Badge triple recovered from rendered markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBadge {
    /// Alternative text of the image.
    pub alt:   String,
    /// Image URL.
    pub image: String,
    /// Link target, absent for bare images.
    pub link:  Option<String>
}

impl From<&BadgeEntry> for ParsedBadge {
    fn from(entry: &BadgeEntry) -> Self {
        Self {
            alt:   entry.alt.clone(),
            image: entry.image.clone(),
            link:  entry.link.clone()
        }
    }
}

/// Runs the `BADGES` transform for the project in the working directory.
///
/// A missing `package.json` yields an empty string.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the descriptor or the merged options are
/// invalid, and [`Error::Io`] when the descriptor cannot be read.
pub fn badges_transform(
    context: &WorkingContext,
    settings: &ConfigObject,
    invocation: &OptionMap
) -> Result<String, Error> {
    let Some(descriptor) = ProjectDescriptor::load(context)? else {
        return Ok(String::new());
    };
    let builtin = BadgeOptions::builtin_for(&descriptor);
    let options = resolve_options(&builtin, settings, BADGES_TRANSFORM, invocation)?;
    Ok(render_badges(&descriptor, &options))
}

/// Renders the badge markdown for `descriptor`.
///
/// # Examples
///
/// ```
/// use scaffold::{BadgeOptions, ProjectDescriptor, render_badges};
///
/// let descriptor = ProjectDescriptor {
///     name: Some("pkg".to_owned()),
///     license: Some("MIT".to_owned()),
///     ..ProjectDescriptor::default()
/// };
/// let markdown = render_badges(&descriptor, &BadgeOptions::default());
/// assert!(markdown.starts_with("[![npm version]"));
/// assert!(markdown.ends_with("license-MIT-blue.svg)"));
/// ```
pub fn render_badges(descriptor: &ProjectDescriptor, options: &BadgeOptions) -> String {
    let entries = build_badges(descriptor, options);
    if entries.is_empty() {
        return String::new();
    }

    if !options.collapse || entries.len() <= options.collapse_visible {
        return join_markdown(entries.iter());
    }

    let (visible, hidden) = partition_badges(&entries, options.collapse_visible);
    debug!("collapsing {} of {} badges", hidden.len(), entries.len());

    let mut rendered = join_markdown(visible.into_iter());
    rendered.push_str("\n\n<details>\n<summary>");
    rendered.push_str(&escape_html(&options.collapse_label));
    rendered.push_str("</summary>\n\n");
    rendered.push_str(&join_markdown(hidden.into_iter()));
    rendered.push_str("\n\n</details>");
    rendered
}

/// Builds badge entries in their fixed insertion order.
///
/// Returns no entries when the descriptor has neither a name nor a
/// repository. Host-dependent badges are skipped when the repository cannot
/// be resolved to coordinates.
pub fn build_badges(descriptor: &ProjectDescriptor, options: &BadgeOptions) -> Vec<BadgeEntry> {
    if descriptor.name.is_none() && descriptor.repository.is_none() {
        return Vec::new();
    }

    let style = options.style.as_deref().filter(|style| !style.is_empty());
    let mut entries = Vec::with_capacity(17);

    if let Some(name) = descriptor.name.as_deref() {
        let encoded = urlencoding::encode(name);
        entries.push(BadgeEntry::linked(
            "npmVersion",
            "npm version",
            with_style(format!("{SHIELDS}/npm/v/{encoded}.svg"), style),
            format!("https://www.npmjs.com/package/{encoded}")
        ));
    }

    if let Some(version) = descriptor.version.as_deref() {
        entries.push(BadgeEntry::bare(
            "version",
            "version",
            with_style(
                format!("{SHIELDS}/badge/version-{}-blue.svg", static_segment(version)),
                style
            )
        ));
    }

    if let Some(license) = descriptor.license.as_deref() {
        entries.push(BadgeEntry::bare(
            "license",
            "license",
            with_style(
                format!("{SHIELDS}/badge/license-{}-blue.svg", static_segment(license)),
                style
            )
        ));
    }

    match descriptor.repo_coordinates() {
        Some(coordinates) => entries.extend(host_badges(&coordinates, options, style)),
        None if descriptor.repository.is_some() => {
            debug!("repository field is not a recognized GitHub reference, skipping host badges");
        }
        None => {}
    }

    entries
}

fn host_badges(
    coordinates: &RepoCoordinates,
    options: &BadgeOptions,
    style: Option<&str>
) -> Vec<BadgeEntry> {
    let slug = coordinates.slug();
    let repo_url = format!("https://github.com/{slug}");
    let workflow = urlencoding::encode(&options.ci_workflow);
    let actions_path = format!("github/actions/workflow/status/{slug}/{workflow}");
    let branch = urlencoding::encode(&options.ci_branch);

    let github = |key: &'static str, alt: &str, path: &str, link: String| {
        let image = with_style(format!("{SHIELDS}/github/{path}/{slug}"), style);
        BadgeEntry::linked(key, alt, image, link)
    };

    vec![
        BadgeEntry::linked(
            "actions",
            "actions status",
            with_style(
                format!("{SHIELDS}/{actions_path}?branch={branch}"),
                style
            ),
            format!("{repo_url}/actions/workflows/{workflow}")
        ),
        BadgeEntry::linked(
            "codecov",
            "codecov",
            with_style(format!("{SHIELDS}/codecov/c/github/{slug}?branch={branch}"), style),
            format!("https://codecov.io/gh/{slug}")
        ),
        github("release", "release", "v/release", format!("{repo_url}/releases")),
        BadgeEntry::linked(
            "maintained",
            "maintained",
            with_style(format!("{SHIELDS}/badge/maintained-yes-brightgreen.svg"), style),
            format!("{repo_url}/graphs/commit-activity")
        ),
        github("stars", "GitHub stars", "stars", format!("{repo_url}/stargazers")),
        github("forks", "GitHub forks", "forks", format!("{repo_url}/network/members")),
        github("watchers", "GitHub watchers", "watchers", format!("{repo_url}/watchers")),
        github("lastCommit", "last commit", "last-commit", format!("{repo_url}/commits")),
        github(
            "contributors",
            "contributors",
            "contributors",
            format!("{repo_url}/graphs/contributors")
        ),
        github("issues", "open issues", "issues", format!("{repo_url}/issues")),
        github("pulls", "open pull requests", "issues-pr", format!("{repo_url}/pulls")),
        github("repoSize", "repo size", "repo-size", repo_url.clone()),
        github("topLanguage", "top language", "languages/top", repo_url.clone()),
        github("languages", "language count", "languages/count", repo_url.clone()),
    ]
}

/// Splits `entries` into the inline group and the collapsed group.
///
/// The inline group holds at most `visible` entries ranked by the preferred
/// key order, ties broken by insertion order. The collapsed group keeps the
/// remaining entries in insertion order.
pub fn partition_badges(
    entries: &[BadgeEntry],
    visible: usize
) -> (Vec<&BadgeEntry>, Vec<&BadgeEntry>) {
    let mut ranked: Vec<(usize, &BadgeEntry)> = entries.iter().enumerate().collect();
    ranked.sort_by_key(|(index, entry)| (visible_rank(entry.key), *index));

    let mut selected = vec![false; entries.len()];
    let shown: Vec<&BadgeEntry> = ranked
        .into_iter()
        .take(visible)
        .map(|(index, entry)| {
            selected[index] = true;
            entry
        })
        .collect();

    let hidden = entries
        .iter()
        .zip(selected)
        .filter_map(|(entry, chosen)| (!chosen).then_some(entry))
        .collect();

    (shown, hidden)
}

fn visible_rank(key: &str) -> usize {
    PREFERRED_VISIBLE
        .iter()
        .position(|preferred| *preferred == key)
        .unwrap_or(PREFERRED_VISIBLE.len())
}

/// Recovers badge triples from rendered markdown, in document order.
pub fn parse_badges(markdown: &str) -> Vec<ParsedBadge> {
    static BADGE_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = BADGE_PATTERN.get_or_init(|| {
        Regex::new(
            r"\[!\[([^\]]*)\]\(([^)\s]+)\)\]\(([^)\s]+)\)|!\[([^\]]*)\]\(([^)\s]+)\)"
        )
        .expect("badge pattern is valid")
    });

    pattern
        .captures_iter(markdown)
        .filter_map(|captures| {
            let linked = (captures.get(1), captures.get(2), captures.get(3));
            if let (Some(alt), Some(image), Some(link)) = linked {
                return Some(ParsedBadge {
                    alt:   alt.as_str().to_owned(),
                    image: image.as_str().to_owned(),
                    link:  Some(link.as_str().to_owned())
                });
            }
            let (alt, image) = (captures.get(4)?, captures.get(5)?);
            Some(ParsedBadge {
                alt:   alt.as_str().to_owned(),
                image: image.as_str().to_owned(),
                link:  None
            })
        })
        .collect()
}

fn join_markdown<'a>(entries: impl Iterator<Item = &'a BadgeEntry>) -> String {
    entries.map(BadgeEntry::to_markdown).collect::<Vec<_>>().join(" ")
}

fn with_style(url: String, style: Option<&str>) -> String {
    match style {
        Some(style) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}style={}", urlencoding::encode(style))
        }
        None => url
    }
}

/// Encodes a value for a static shields.io path segment.
///
/// Dashes and underscores are doubled because single ones act as field
/// separators in the static badge path.
fn static_segment(value: &str) -> String {
    let escaped = value.replace('-', "--").replace('_', "__");
    urlencoding::encode(&escaped).into_owned()
}

fn escape_html(text: &str) -> Cow<'_, str> {
    if text.chars().any(|character| matches!(character, '&' | '<' | '>' | '"' | '\'')) {
        Cow::Owned(
            text.replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('"', "&quot;")
                .replace('\'', "&#x27;")
        )
    } else {
        Cow::Borrowed(text)
    }
}
