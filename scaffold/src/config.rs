// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Cascading configuration loader.
//!
//! Configuration is resolved from the first source that yields a document:
//!
//! 1. an inline JSON object passed through `--config`;
//! 2. a file path passed through `--config`, relative to the working
//!    directory;
//! 3. cascade discovery upward from the working directory;
//! 4. the bundled default configuration, or an empty object.
//!
//! Runtime flags are shallow-merged on top of the selected document. Files are
//! always deserialized as JSON or YAML and never executed.

use std::{
    fs,
    path::{Path, PathBuf}
};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    context::WorkingContext,
    error::{self, Error}
};

/// Dynamic configuration document keyed by top-level section.
pub type ConfigObject = Map<String, Value>;

/// Name used for discovered configuration files and the `package.json` field.
pub const MODULE_NAME: &str = "scaffold";

/// Command-line flags overlaid on top of the loaded configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeFlags {
    /// Enables informational logging.
    pub verbose: bool,
    /// Enables debug output.
    pub debug:   bool,
    /// Suppresses regular output.
    pub quiet:   bool,
    /// Raw `--config` argument, either inline JSON or a file path.
    pub config:  Option<String>
}

impl RuntimeFlags {
    /// Converts the flags into the top-level keys merged over the config.
    fn to_object(&self) -> ConfigObject {
        let mut object = ConfigObject::new();
        object.insert("verbose".to_owned(), Value::Bool(self.verbose));
        object.insert("debug".to_owned(), Value::Bool(self.debug));
        object.insert("quiet".to_owned(), Value::Bool(self.quiet));
        if let Some(config) = self.config.as_ref() {
            object.insert("config".to_owned(), Value::String(config.clone()));
        }
        object
    }

    fn globals(&self) -> Value {
        let mut globals = ConfigObject::new();
        globals.insert("verbose".to_owned(), Value::Bool(self.verbose));
        globals.insert("debug".to_owned(), Value::Bool(self.debug));
        globals.insert("quiet".to_owned(), Value::Bool(self.quiet));
        Value::Object(globals)
    }
}

/// Configuration located by a [`ConfigDiscovery`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredConfig {
    /// File the configuration was read from.
    pub path:   PathBuf,
    /// Decoded configuration document.
    pub config: ConfigObject
}

/// Search strategy used when no explicit configuration is supplied.
pub trait ConfigDiscovery {
    /// Searches for a configuration document starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] when a recognized file exists but cannot
    /// be decoded.
    fn search(&self, start: &Path) -> Result<Option<DiscoveredConfig>, Error>;
}

/// Supplier of the configuration used when discovery finds nothing.
pub trait DefaultConfigProvider {
    /// Returns the default configuration, or `None` when none is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] when the default file exists but cannot
    /// be decoded.
    fn load_default(&self) -> Result<Option<ConfigObject>, Error>;
}

/// Discovery walking from the start directory towards the filesystem root.
///
/// Each directory is checked for, in order, a `scaffold` field in
/// `package.json`, `.scaffoldrc`, `.scaffoldrc.json`, `.scaffoldrc.yaml`,
/// `.scaffoldrc.yml`, `scaffold.config.json`, `scaffold.config.yaml` and
/// `scaffold.config.yml`. Empty documents are skipped.
#[derive(Debug, Clone)]
pub struct CascadeDiscovery {
    module_name: String,
    stop_dir:    Option<PathBuf>
}

impl Default for CascadeDiscovery {
    fn default() -> Self {
        Self::new(MODULE_NAME)
    }
}

impl CascadeDiscovery {
    /// Creates a discovery for the provided module name.
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            stop_dir:    None
        }
    }

    /// Stops the upward search after visiting `dir`.
    pub fn stop_at(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stop_dir = Some(dir.into());
        self
    }

    fn candidate_files(&self) -> Vec<String> {
        let name = self.module_name.as_str();
        vec![
            format!(".{name}rc"),
            format!(".{name}rc.json"),
            format!(".{name}rc.yaml"),
            format!(".{name}rc.yml"),
            format!("{name}.config.json"),
            format!("{name}.config.yaml"),
            format!("{name}.config.yml"),
        ]
    }

    fn package_field(&self, dir: &Path) -> Option<DiscoveredConfig> {
        let path = dir.join("package.json");
        let contents = fs::read_to_string(&path).ok()?;
        let mut document: Value = match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(error) => {
                debug!("ignoring unreadable {}: {error}", path.display());
                return None;
            }
        };

        match document.get_mut(self.module_name.as_str()).map(Value::take) {
            Some(Value::Object(config)) => Some(DiscoveredConfig {
                path,
                config
            }),
            _ => None
        }
    }
}

impl ConfigDiscovery for CascadeDiscovery {
    fn search(&self, start: &Path) -> Result<Option<DiscoveredConfig>, Error> {
        let candidates = self.candidate_files();
        let mut current = Some(start);

        while let Some(dir) = current {
            debug!("searching {} for configuration", dir.display());

            if let Some(found) = self.package_field(dir)
                && !found.config.is_empty()
            {
                return Ok(Some(found));
            }

            for candidate in &candidates {
                let path = dir.join(candidate);
                if !path.is_file() {
                    continue;
                }
                let config = parse_config_file(&path)?;
                if config.is_empty() {
                    debug!("skipping empty configuration {}", path.display());
                    continue;
                }
                return Ok(Some(DiscoveredConfig {
                    path,
                    config
                }));
            }

            if self.stop_dir.as_deref() == Some(dir) {
                break;
            }
            current = dir.parent();
        }

        Ok(None)
    }
}

/// Default provider backed by an optional file on disk.
#[derive(Debug, Clone, Default)]
pub struct BundledDefaults {
    path: Option<PathBuf>
}

impl BundledDefaults {
    /// Creates a provider reading `path` when it exists.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path
        }
    }

    /// Creates a provider from the context's bundled default location.
    pub fn from_context(context: &WorkingContext) -> Self {
        Self::new(context.default_config.clone())
    }
}

impl DefaultConfigProvider for BundledDefaults {
    fn load_default(&self) -> Result<Option<ConfigObject>, Error> {
        match self.path.as_deref() {
            Some(path) if path.is_file() => parse_config_file(path).map(Some),
            _ => Ok(None)
        }
    }
}

/// Loads the cascaded configuration and overlays the runtime flags.
///
/// # Errors
///
/// Returns [`Error::InlineConfig`] for malformed inline JSON,
/// [`Error::ConfigNotFound`] when an explicit path does not exist and
/// [`Error::ConfigLoad`] when a configuration file cannot be decoded. All of
/// them are meant to terminate the process.
///
/// # Examples
///
/// ```
/// use scaffold::{BundledDefaults, CascadeDiscovery, RuntimeFlags, WorkingContext, load_config};
///
/// let flags = RuntimeFlags {
///     config: Some(r#"{"hello":{"name":"X"}}"#.to_owned()),
///     ..RuntimeFlags::default()
/// };
/// let context = WorkingContext::new(".");
/// let config = load_config(
///     &context,
///     &flags,
///     &CascadeDiscovery::default(),
///     &BundledDefaults::default()
/// )?;
/// assert_eq!(config["hello"]["name"], "X");
/// assert_eq!(config["quiet"], false);
/// # Ok::<(), scaffold::Error>(())
/// ```
pub fn load_config(
    context: &WorkingContext,
    flags: &RuntimeFlags,
    discovery: &dyn ConfigDiscovery,
    defaults: &dyn DefaultConfigProvider
) -> Result<ConfigObject, Error> {
    let mut config = load_cascade(context, flags.config.as_deref(), discovery, defaults)?;
    config.extend(flags.to_object());
    Ok(config)
}

/// Returns `config` with a `globals` section describing the runtime flags.
///
/// Command handlers read verbosity from this section rather than from the
/// top-level keys so that a configuration section never collides with them.
pub fn with_globals(mut config: ConfigObject, flags: &RuntimeFlags) -> ConfigObject {
    config.insert("globals".to_owned(), flags.globals());
    config
}

/// Selects the configuration document without the runtime flag overlay.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_cascade(
    context: &WorkingContext,
    explicit: Option<&str>,
    discovery: &dyn ConfigDiscovery,
    defaults: &dyn DefaultConfigProvider
) -> Result<ConfigObject, Error> {
    if let Some(explicit) = explicit {
        let trimmed = explicit.trim();
        if trimmed.starts_with('{') {
            debug!("parsing inline configuration");
            return parse_inline(trimmed);
        }

        let path = context.resolve_path(Path::new(trimmed));
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path
            });
        }
        info!("loading configuration from {}", path.display());
        return parse_config_file(&path);
    }

    if let Some(found) = discovery.search(&context.cwd)?
        && !found.config.is_empty()
    {
        info!("using discovered configuration {}", found.path.display());
        return Ok(found.config);
    }

    match defaults.load_default()? {
        Some(config) => {
            debug!("using bundled default configuration");
            Ok(config)
        }
        None => {
            debug!("no configuration found, using an empty object");
            Ok(ConfigObject::new())
        }
    }
}

fn parse_inline(input: &str) -> Result<ConfigObject, Error> {
    serde_json::from_str::<ConfigObject>(input).map_err(|source| Error::InlineConfig {
        input: input.to_owned(),
        source
    })
}

/// Decodes a configuration file according to its extension.
///
/// `.json` files are decoded as JSON; `.yaml`, `.yml` and extension-less rc
/// files are decoded as YAML, which also accepts JSON documents. Script
/// configuration files are rejected. An empty document yields an empty
/// object.
///
/// # Errors
///
/// Returns [`Error::ConfigLoad`] when the file cannot be read, cannot be
/// decoded, or its root is not an object.
pub fn parse_config_file(path: &Path) -> Result<ConfigObject, Error> {
    let contents = fs::read_to_string(path)
        .map_err(|source| Error::config_load(path, error::io_error(path, source).to_string()))?;

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    let document: Value = match extension {
        "json" => serde_json::from_str(&contents)
            .map_err(|source| Error::config_load(path, source.to_string()))?,
        "js" | "cjs" | "mjs" | "ts" => {
            return Err(Error::config_load(
                path,
                "script configuration files are not supported; use JSON or YAML"
            ));
        }
        _ => serde_yaml::from_str(&contents)
            .map_err(|source| Error::config_load(path, source.to_string()))?
    };

    match document {
        Value::Object(config) => Ok(config),
        Value::Null => Ok(ConfigObject::new()),
        _ => Err(Error::config_load(path, "configuration root must be an object"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    struct NoDiscovery;

    impl ConfigDiscovery for NoDiscovery {
        fn search(&self, _start: &Path) -> Result<Option<DiscoveredConfig>, Error> {
            Ok(None)
        }
    }

    struct FixedDiscovery(ConfigObject);

    impl ConfigDiscovery for FixedDiscovery {
        fn search(&self, start: &Path) -> Result<Option<DiscoveredConfig>, Error> {
            Ok(Some(DiscoveredConfig {
                path:   start.join(".scaffoldrc"),
                config: self.0.clone()
            }))
        }
    }

    fn object(value: Value) -> ConfigObject {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}")
        }
    }

    fn flags_with(config: Option<&str>) -> RuntimeFlags {
        RuntimeFlags {
            config: config.map(str::to_owned),
            ..RuntimeFlags::default()
        }
    }

    #[test]
    fn inline_json_wins_over_discovery() {
        let context = WorkingContext::new("/nowhere");
        let discovery = FixedDiscovery(object(json!({ "hello": { "name": "found" } })));
        let config = load_config(
            &context,
            &flags_with(Some(r#"  {"hello":{"name":"X","title":"Y"}}"#)),
            &discovery,
            &BundledDefaults::default()
        )
        .expect("inline config should load");

        assert_eq!(config["hello"], json!({ "name": "X", "title": "Y" }));
    }

    #[test]
    fn malformed_inline_json_is_reported() {
        let context = WorkingContext::new("/nowhere");
        let error = load_config(
            &context,
            &flags_with(Some("{not json")),
            &NoDiscovery,
            &BundledDefaults::default()
        )
        .expect_err("malformed inline config must fail");

        match error {
            Error::InlineConfig {
                input, ..
            } => assert_eq!(input, "{not json"),
            other => panic!("unexpected error variant: {other:?}")
        }
    }

    #[test]
    fn missing_config_file_is_reported_with_resolved_path() {
        let directory = tempdir().expect("failed to create temp dir");
        let context = WorkingContext::new(directory.path());
        let error = load_config(
            &context,
            &flags_with(Some("missing.json")),
            &NoDiscovery,
            &BundledDefaults::default()
        )
        .expect_err("missing file must fail");

        match error {
            Error::ConfigNotFound {
                path
            } => assert_eq!(path, directory.path().join("missing.json")),
            other => panic!("unexpected error variant: {other:?}")
        }
    }

    #[test]
    fn relative_config_file_is_loaded_from_cwd() {
        let directory = tempdir().expect("failed to create temp dir");
        fs::create_dir(directory.path().join("conf")).expect("failed to create conf dir");
        fs::write(
            directory.path().join("conf/app.yaml"),
            "hello:\n  name: RelName\n  title: Prof.\n"
        )
        .expect("failed to write config");

        let context = WorkingContext::new(directory.path());
        let config = load_config(
            &context,
            &flags_with(Some("conf/app.yaml")),
            &NoDiscovery,
            &BundledDefaults::default()
        )
        .expect("config should load");

        assert_eq!(config["hello"]["name"], "RelName");
        assert_eq!(config["config"], "conf/app.yaml");
    }

    #[test]
    fn unparseable_config_file_is_a_load_error() {
        let directory = tempdir().expect("failed to create temp dir");
        let path = directory.path().join("broken.json");
        fs::write(&path, "{ broken").expect("failed to write config");

        let error = parse_config_file(&path).expect_err("broken file must fail");
        assert!(matches!(error, Error::ConfigLoad { .. }));
    }

    #[test]
    fn script_config_files_are_rejected() {
        let directory = tempdir().expect("failed to create temp dir");
        let path = directory.path().join("app.config.js");
        fs::write(&path, "module.exports = {};").expect("failed to write config");

        let error = parse_config_file(&path).expect_err("script config must fail");
        assert!(error.to_string().contains("not supported"));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let directory = tempdir().expect("failed to create temp dir");
        let path = directory.path().join("list.yaml");
        fs::write(&path, "- a\n- b\n").expect("failed to write config");

        let error = parse_config_file(&path).expect_err("list root must fail");
        assert!(error.to_string().contains("must be an object"));
    }

    #[test]
    fn discovery_result_is_used_without_explicit_config() {
        let context = WorkingContext::new("/nowhere");
        let discovery = FixedDiscovery(object(json!({ "hello": { "title": "Dr." } })));
        let config =
            load_config(&context, &RuntimeFlags::default(), &discovery, &BundledDefaults::default())
                .expect("discovered config should load");

        assert_eq!(config["hello"]["title"], "Dr.");
        assert!(config.get("config").is_none());
    }

    #[test]
    fn bundled_defaults_are_used_when_discovery_is_empty() {
        let directory = tempdir().expect("failed to create temp dir");
        let path = directory.path().join("default.config.yaml");
        fs::write(&path, "hello:\n  name: Ion\n  title: Mr.\n").expect("failed to write defaults");

        let context = WorkingContext::new(directory.path()).with_default_config(&path);
        let config = load_config(
            &context,
            &RuntimeFlags::default(),
            &NoDiscovery,
            &BundledDefaults::from_context(&context)
        )
        .expect("defaults should load");

        assert_eq!(config["hello"]["name"], "Ion");
    }

    #[test]
    fn empty_object_is_used_when_nothing_is_available() {
        let context = WorkingContext::new("/nowhere");
        let config = load_cascade(
            &context,
            None,
            &NoDiscovery,
            &BundledDefaults::new(Some(PathBuf::from("/definitely/missing.yaml")))
        )
        .expect("empty config expected");

        assert!(config.is_empty());
    }

    #[test]
    fn runtime_flags_overwrite_top_level_keys_shallowly() {
        let context = WorkingContext::new("/nowhere");
        let discovery = FixedDiscovery(object(json!({
            "quiet": { "nested": true },
            "hello": { "name": "N" }
        })));
        let flags = RuntimeFlags {
            quiet: true,
            ..RuntimeFlags::default()
        };

        let config = load_config(&context, &flags, &discovery, &BundledDefaults::default())
            .expect("config should load");

        assert_eq!(config["quiet"], true);
        assert_eq!(config["hello"]["name"], "N");
    }

    #[test]
    fn globals_section_mirrors_flags() {
        let flags = RuntimeFlags {
            debug: true,
            ..RuntimeFlags::default()
        };
        let config = with_globals(ConfigObject::new(), &flags);
        assert_eq!(config["globals"], json!({ "verbose": false, "debug": true, "quiet": false }));
    }

    #[test]
    fn cascade_discovery_walks_upward() {
        let root = tempdir().expect("failed to create temp dir");
        let nested = root.path().join("a/b");
        fs::create_dir_all(&nested).expect("failed to create nested dirs");
        fs::write(root.path().join(".scaffoldrc.json"), r#"{"hello":{"name":"Up"}}"#)
            .expect("failed to write rc");

        let discovery = CascadeDiscovery::default().stop_at(root.path());
        let found = discovery
            .search(&nested)
            .expect("search should succeed")
            .expect("config should be discovered");

        assert_eq!(found.path, root.path().join(".scaffoldrc.json"));
        assert_eq!(found.config["hello"]["name"], "Up");
    }

    #[test]
    fn cascade_discovery_prefers_package_json_field() {
        let root = tempdir().expect("failed to create temp dir");
        fs::write(
            root.path().join("package.json"),
            r#"{"name":"pkg","scaffold":{"hello":{"name":"Pkg"}}}"#
        )
        .expect("failed to write package.json");
        fs::write(root.path().join(".scaffoldrc"), "hello:\n  name: Rc\n")
            .expect("failed to write rc");

        let discovery = CascadeDiscovery::default().stop_at(root.path());
        let found = discovery
            .search(root.path())
            .expect("search should succeed")
            .expect("config should be discovered");

        assert_eq!(found.config["hello"]["name"], "Pkg");
    }

    #[test]
    fn empty_discovered_file_falls_through_to_defaults() {
        let root = tempdir().expect("failed to create temp dir");
        fs::write(root.path().join(".scaffoldrc.yaml"), "").expect("failed to write rc");
        let defaults = root.path().join("default.config.yaml");
        fs::write(&defaults, "hello:\n  name: Ion\n").expect("failed to write defaults");

        let context = WorkingContext::new(root.path()).with_default_config(&defaults);
        let config = load_config(
            &context,
            &RuntimeFlags::default(),
            &CascadeDiscovery::default().stop_at(root.path()),
            &BundledDefaults::from_context(&context)
        )
        .expect("config should load");

        assert_eq!(config["hello"]["name"], "Ion");
    }

    #[test]
    fn empty_candidates_do_not_stop_the_upward_search() {
        let root = tempdir().expect("failed to create temp dir");
        let nested = root.path().join("child");
        fs::create_dir_all(&nested).expect("failed to create nested dir");
        fs::write(nested.join(".scaffoldrc"), "~\n").expect("failed to write rc");
        fs::write(nested.join("package.json"), r#"{"scaffold":{}}"#)
            .expect("failed to write package.json");
        fs::write(root.path().join("scaffold.config.json"), r#"{"hello":{"name":"Up"}}"#)
            .expect("failed to write config");

        let found = CascadeDiscovery::default()
            .stop_at(root.path())
            .search(&nested)
            .expect("search should succeed")
            .expect("config should be discovered");

        assert_eq!(found.path, root.path().join("scaffold.config.json"));
    }

    #[test]
    fn empty_result_from_custom_discovery_is_ignored() {
        let directory = tempdir().expect("failed to create temp dir");
        let defaults = directory.path().join("default.config.yaml");
        fs::write(&defaults, "hello:\n  title: Mr.\n").expect("failed to write defaults");

        let context = WorkingContext::new(directory.path());
        let config = load_cascade(
            &context,
            None,
            &FixedDiscovery(ConfigObject::new()),
            &BundledDefaults::new(Some(defaults))
        )
        .expect("defaults should load");
        assert_eq!(config["hello"]["title"], "Mr.");
    }

    #[test]
    fn cascade_discovery_stops_at_boundary() {
        let root = tempdir().expect("failed to create temp dir");
        let discovery = CascadeDiscovery::default().stop_at(root.path());
        assert!(discovery.search(root.path()).expect("search should succeed").is_none());
    }
}
