// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Command-line interface for the scaffold binary.
//!
//! Global flags are resolved into a cascaded configuration before any
//! subcommand runs. Configuration errors terminate the process with a
//! diagnostic and a non-zero exit status.

use std::{
    io,
    path::{Path, PathBuf},
    process
};

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use scaffold::{
    BundledDefaults, CascadeDiscovery, ConfigObject, DocGenerator, Error, RuntimeFlags, WalkScanner,
    WorkingContext, io_error, load_config, resolve_hello, run_hello, with_globals
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Scaffold CLI with cascading configuration and README generation.
#[derive(Debug, Parser)]
#[command(name = "scaffold", version, about = "CLI scaffold with cascading configuration")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>
}

/// Flags accepted before or after any subcommand.
#[derive(Debug, Args, Default)]
struct GlobalArgs {
    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Enable debug mode
    #[arg(long = "debug", global = true, action = ArgAction::SetTrue)]
    debug: bool,

    /// Suppress output
    #[arg(long = "quiet", global = true, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Path to config file or JSON string
    #[arg(short = 'c', long = "config", value_name = "fileOrJson", global = true)]
    config: Option<String>
}

impl GlobalArgs {
    fn runtime_flags(&self) -> RuntimeFlags {
        RuntimeFlags {
            verbose: self.verbose,
            debug:   self.debug,
            quiet:   self.quiet,
            config:  self.config.clone()
        }
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Say hello to someone
    Hello(HelloArgs),
    /// Regenerate doc-gen regions in markdown files
    Docs(DocsArgs)
}

#[derive(Debug, Args)]
struct HelloArgs {
    /// Name to greet
    name: Option<String>,

    /// Add a title before the name
    #[arg(short = 't', long = "title", value_name = "title")]
    title: Option<String>
}

#[derive(Debug, Args)]
struct DocsArgs {
    /// Markdown file to update; may be repeated.
    #[arg(long = "file", value_name = "PATH", default_value = "README.md")]
    files: Vec<PathBuf>,

    /// Report stale files without writing them.
    #[arg(long = "check", action = ArgAction::SetTrue)]
    check: bool
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main() {
    if let Err(error) = run() {
        eprintln!("{}", error.to_display_string());
        process::exit(1);
    }
}

/// Executes the CLI using parsed arguments.
///
/// Configuration is loaded before dispatch, so an unusable `--config` fails
/// even when no subcommand is given.
///
/// # Errors
///
/// Propagates configuration, descriptor and output errors.
fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    let context = WorkingContext::from_process()?;
    let flags = cli.global.runtime_flags();
    let config = load_config(
        &context,
        &flags,
        &CascadeDiscovery::default(),
        &BundledDefaults::from_context(&context)
    )?;
    let config = with_globals(config, &flags);
    debug!("configuration keys: {:?}", config.keys().collect::<Vec<_>>());

    let Some(command) = cli.command else {
        return print_help();
    };

    match command {
        Command::Hello(args) => run_hello_command(&args, &config),
        Command::Docs(args) => run_docs(&args, &context, &config)
    }
}

fn init_tracing(global: &GlobalArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(global.log_level()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_help() -> Result<(), Error> {
    Cli::command()
        .print_help()
        .map_err(|source| io_error(Path::new("<stdout>"), source))?;
    println!();
    Ok(())
}

fn run_hello_command(args: &HelloArgs, config: &ConfigObject) -> Result<(), Error> {
    let input = resolve_hello(args.name.as_deref(), args.title.as_deref(), config);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    run_hello(&mut handle, &input)
}

fn run_docs(args: &DocsArgs, context: &WorkingContext, config: &ConfigObject) -> Result<(), Error> {
    let scanner = WalkScanner;
    let generator = DocGenerator::new(context, config, &scanner);

    let mut stale = Vec::new();
    for file in &args.files {
        let path = context.resolve_path(file);
        if generator.update_file(&path, args.check)? {
            stale.push(path.display().to_string());
        }
    }

    if args.check && !stale.is_empty() {
        return Err(Error::validation(format!("out of date: {}", stale.join(", "))));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use tempfile::tempdir;

    use super::{Cli, Command, WorkingContext, run_docs};

    #[test]
    fn cli_without_command_parses() {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME")]).expect("failed to parse CLI");
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "hello",
            "Alice",
            "--debug",
            "-c",
            "{\"hello\":{}}",
        ])
        .expect("failed to parse CLI");

        assert!(cli.global.debug);
        assert_eq!(cli.global.config.as_deref(), Some("{\"hello\":{}}"));
        match cli.command.expect("missing command") {
            Command::Hello(args) => {
                assert_eq!(args.name.as_deref(), Some("Alice"));
                assert!(args.title.is_none());
            }
            other => panic!("unexpected command variant: {other:?}")
        }
    }

    #[test]
    fn hello_accepts_short_title() {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "hello", "-t", "Dr."])
            .expect("failed to parse CLI");
        match cli.command.expect("missing command") {
            Command::Hello(args) => assert_eq!(args.title.as_deref(), Some("Dr.")),
            other => panic!("unexpected command variant: {other:?}")
        }
    }

    #[test]
    fn log_level_follows_flags() {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "--quiet", "--debug", "hello"])
            .expect("failed to parse CLI");
        assert_eq!(cli.global.log_level(), "error");

        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "-v", "hello"])
            .expect("failed to parse CLI");
        assert_eq!(cli.global.log_level(), "info");
    }

    #[test]
    fn docs_defaults_to_readme() {
        let cli =
            Cli::try_parse_from([env!("CARGO_PKG_NAME"), "docs"]).expect("failed to parse CLI");
        match cli.command.expect("missing command") {
            Command::Docs(args) => {
                assert_eq!(args.files, vec![std::path::PathBuf::from("README.md")]);
                assert!(!args.check);
            }
            other => panic!("unexpected command variant: {other:?}")
        }
    }

    #[test]
    fn docs_check_reports_stale_files() {
        let temp = tempdir().expect("failed to create tempdir");
        fs::write(temp.path().join("package.json"), r#"{"name":"pkg"}"#)
            .expect("failed to write descriptor");
        fs::write(temp.path().join("README.md"), "<!-- doc-gen BADGES -->\n<!-- end-doc-gen -->\n")
            .expect("failed to write README");

        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "docs", "--check"])
            .expect("failed to parse CLI");
        let args = match cli.command.expect("missing command") {
            Command::Docs(args) => args,
            other => panic!("unexpected command variant: {other:?}")
        };

        let context = WorkingContext::new(temp.path());
        let config = scaffold::ConfigObject::new();
        let error =
            run_docs(&args, &context, &config).expect_err("stale README must fail the check");
        assert!(error.to_string().contains("out of date"));
    }
}
