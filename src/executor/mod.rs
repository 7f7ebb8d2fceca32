//! Suite execution engine
//!
//! Entry points for running one suite or a whole registry. Each call runs on
//! a blocking worker inside a panic boundary; a tracker task aggregates the
//! outcomes.

mod dispatch;
pub mod panics;
mod runner;
mod tracker;

use tracing::{debug, error};

use crate::config::RunConfig;
use crate::filter::Filter;
use crate::models::{RunError, RunResult};
use crate::suite::{classify, Registry, Suite};
use runner::SuiteRunner;

/// Run every selected test of `suite`
pub async fn run<S: Suite>(suite: S, config: &RunConfig) -> RunResult {
    match config.compile_filter() {
        Ok(filter) => run_filtered(suite, config, &filter).await,
        Err(e) => {
            error!("{}", e);
            RunResult::from_error(e)
        }
    }
}

pub(crate) async fn run_filtered<S: Suite>(
    suite: S,
    config: &RunConfig,
    filter: &Filter,
) -> RunResult {
    let table = classify::<S>();
    let tests = table.select(filter);
    if tests.is_empty() {
        debug!("No tests selected in {}", table.suite);
        return RunResult::new();
    }
    SuiteRunner::new(suite, table, tests, config).run().await
}

/// Run every registered suite, one after another, and merge the results
///
/// A bad filter fails the whole run before any suite method executes.
pub async fn run_all(registry: Registry, config: &RunConfig) -> RunResult {
    let filter = match config.compile_filter() {
        Ok(filter) => filter,
        Err(e) => {
            error!("{}", e);
            return RunResult::from_error(e);
        }
    };

    let mut total = RunResult::new();
    for suite in registry.into_suites() {
        total += &suite.run(config, &filter).await;
    }
    total
}

/// Qualified names of the tests a run with `config` would execute
pub fn list(registry: &Registry, config: &RunConfig) -> Result<Vec<String>, RunError> {
    let filter = config.compile_filter()?;
    Ok(registry
        .suites()
        .flat_map(|suite| suite.test_names(&filter))
        .collect())
}
