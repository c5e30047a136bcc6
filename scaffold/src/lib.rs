// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Command-line scaffold with cascading configuration and README generation.
//!
//! The library exposes the pieces used by the `scaffold` binary: a
//! three-tier value resolver, a cascading configuration loader, and two
//! documentation transforms that render project badges and dependency
//! acknowledgments into markdown regions marked with `doc-gen` directives.
//! Ambient process state is passed explicitly through [`WorkingContext`].

mod acknowledgments;
mod badges;
mod config;
mod context;
mod descriptor;
mod docgen;
mod error;
mod hello;
mod options;
mod resolve;
mod scan;

pub use acknowledgments::{
    ACKNOWLEDGMENTS_TRANSFORM, AcknowledgmentOptions, Acknowledgments, DependencyEntry,
    NO_DESCRIPTION, acknowledgments_transform, render_acknowledgments
};
pub use badges::{
    BADGES_TRANSFORM, BadgeEntry, BadgeOptions, ParsedBadge, badges_transform, build_badges,
    parse_badges, partition_badges, render_badges
};
pub use config::{
    BundledDefaults, CascadeDiscovery, ConfigDiscovery, ConfigObject, DefaultConfigProvider,
    DiscoveredConfig, MODULE_NAME, RuntimeFlags, load_cascade, load_config, parse_config_file,
    with_globals
};
pub use context::{DEFAULT_CONFIG_ENV, WorkingContext};
pub use descriptor::{ProjectDescriptor, RepoCoordinates, Repository, parse_repository};
pub use docgen::{DocGenerator, Directive, END_MARKER, parse_directive};
pub use error::{Error, io_error};
pub use hello::{HelloInput, HelloOptions, greeting, resolve_hello, run_hello};
pub use options::{OptionMap, merge_layers, resolve_options, transform_defaults};
pub use resolve::{present, resolve, resolve_string};
pub use scan::{FileScanner, MAX_SCAN_BYTES, ScannedFile, WalkScanner};
