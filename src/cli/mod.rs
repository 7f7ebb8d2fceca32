//! CLI argument parsing
//!
//! Command-line front end for harness binaries: parse flags, layer them over
//! the environment and an optional config file, then run or list a registry.

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::{debug, info};

use crate::config::{env_help, EnvConfig, FileConfig, Settings};
use crate::executor::{list, run_all};
use crate::output::OutputSink;
use crate::suite::Registry;
use crate::utils::init_logger;

/// Suite runner
#[derive(Parser, Debug, Default)]
#[command(name = "suitecheck")]
#[command(version)]
#[command(about = "Run the registered test suites")]
#[command(long_about = None)]
pub struct Args {
    /// Regular expression selecting tests by name, suite or Suite.test
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Report passed, skipped and missed tests too
    #[arg(short, long)]
    pub verbose: bool,

    /// Report calls as they start (implies --verbose)
    #[arg(long)]
    pub stream: bool,

    /// Output format (text, json, ci-event)
    #[arg(long)]
    pub format: Option<String>,

    /// List the selected tests instead of running them
    #[arg(long)]
    pub list: bool,

    /// Configuration file (YAML or JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Parse arguments, appending the environment variable help to `--help`
    pub fn try_parse_with_env<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .after_help(env_help())
            .try_get_matches_from(iter)?;
        Self::from_arg_matches(&matches)
    }

    /// Settings given on the command line; unset flags stay unset
    pub fn settings(&self) -> Settings {
        Settings {
            filter: self.filter.clone(),
            verbose: self.verbose.then_some(true),
            stream: self.stream.then_some(true),
            format: self.format.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Entry point for harness binaries
///
/// ```ignore
/// fn main() -> std::process::ExitCode {
///     suitecheck::cli::main(Registry::new().with(MathSuite::default()))
/// }
/// ```
pub fn main(registry: Registry) -> ExitCode {
    let args = match Args::try_parse_with_env(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
        }
    };

    match execute(args, registry, EnvConfig::load(), OutputSink::stdout()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve settings, then list or run `registry`
///
/// Returns whether the run passed.
pub fn execute(args: Args, registry: Registry, env: EnvConfig, output: OutputSink) -> Result<bool> {
    let file = match args.config.as_ref().or(env.config_file.as_ref()) {
        Some(path) => FileConfig::load(path)?.settings(),
        None => Settings::default(),
    };
    let settings = args.settings().or(env.settings()).or(file);

    init_logger(settings.log_level()?);
    debug!("Resolved settings: {:?}", settings);

    let config = settings.into_run_config(output)?;

    if args.list {
        for name in list(&registry, &config)? {
            config.output.emit(&format!("{name}\n"));
        }
        return Ok(true);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    info!("Running {} suites", registry.len());
    let result = runtime.block_on(run_all(registry, &config));
    config
        .output
        .emit(&config.formatter().format_summary(&result));

    Ok(result.passed())
}
