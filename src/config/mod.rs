//! Configuration module
//!
//! Run-time configuration plus the layered settings it is resolved from:
//! command line over `SUITECHECK_*` environment over config file over
//! defaults.

mod env;
mod file;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::models::RunError;
use crate::output::{OutputFormat, OutputSink, ResultFormatter};
use crate::utils::LogLevel;

pub use env::{env_help, EnvConfig, ENV_PREFIX};
pub use file::FileConfig;

/// Configuration of one run
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    /// Report destination
    pub output: OutputSink,

    /// Test selection pattern
    pub filter: Option<String>,

    /// Report passed, skipped and missed tests too
    pub verbose: bool,

    /// Report calls as they start; implies verbose
    pub stream: bool,

    pub format: OutputFormat,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose || self.stream
    }

    pub fn formatter(&self) -> ResultFormatter {
        ResultFormatter::new(self.format)
            .verbose(self.verbose)
            .stream(self.stream)
    }

    /// Compile the filter pattern
    pub fn compile_filter(&self) -> Result<Filter, RunError> {
        Ok(Filter::from_option(self.filter.as_deref())?)
    }
}

/// One layer of optional settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub filter: Option<String>,
    pub verbose: Option<bool>,
    pub stream: Option<bool>,
    pub format: Option<String>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Fill unset values from a lower-precedence layer
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            filter: self.filter.or(lower.filter),
            verbose: self.verbose.or(lower.verbose),
            stream: self.stream.or(lower.stream),
            format: self.format.or(lower.format),
            log_level: self.log_level.or(lower.log_level),
        }
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        match self.format.as_deref() {
            None => Ok(OutputFormat::default()),
            Some(name) => match OutputFormat::from_str(name) {
                Some(format) => Ok(format),
                None => bail!("Unknown output format: {name}"),
            },
        }
    }

    pub fn log_level(&self) -> Result<LogLevel> {
        match self.log_level.as_deref() {
            None => Ok(LogLevel::default()),
            Some(name) => match LogLevel::from_str(name) {
                Some(level) => Ok(level),
                None => bail!("Unknown log level: {name}"),
            },
        }
    }

    /// Resolve into a run configuration writing to `output`
    pub fn into_run_config(self, output: OutputSink) -> Result<RunConfig> {
        let format = self.output_format()?;
        Ok(RunConfig {
            output,
            filter: self.filter.filter(|f| !f.is_empty()),
            verbose: self.verbose.unwrap_or(false),
            stream: self.stream.unwrap_or(false),
            format,
        })
    }
}
