//! Suite execution runner
//!
//! Drives one suite instance through
//! `set_up_suite -> {set_up_test -> test -> tear_down_test}* -> tear_down_suite`,
//! one call at a time, and decides which calls cascade into skips or misses.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::dispatch::{invoke, shape_error};
use super::tracker::ResultTracker;
use crate::config::RunConfig;
use crate::models::{Call, CallKind, CallStatus, Method, MethodBody, Role, RunResult};
use crate::suite::{MethodTable, Suite};
use crate::utils::Timer;

const FIXTURE_PANICKED: &str = "Fixture has panicked (see related PANIC)";
const FIXTURE_FAILED: &str = "Fixture has failed (see related FAIL)";

/// Runner for one suite instance
pub(crate) struct SuiteRunner<S: Suite> {
    /// None once a worker task was lost together with the instance
    suite: Option<S>,
    table: MethodTable<S>,
    tests: Vec<Method<S>>,
    tracker: ResultTracker,
}

impl<S: Suite> SuiteRunner<S> {
    /// Create a runner for the selected `tests`; starts the result tracker
    pub(crate) fn new(
        suite: S,
        table: MethodTable<S>,
        tests: Vec<Method<S>>,
        config: &RunConfig,
    ) -> Self {
        let tracker = ResultTracker::start(config.formatter(), config.output.clone());
        Self {
            suite: Some(suite),
            table,
            tests,
            tracker,
        }
    }

    /// Run the whole schedule and return the suite's counters
    pub(crate) async fn run(mut self) -> RunResult {
        let timer = Timer::start(self.table.suite.clone());
        info!(
            "Running {} ({} of {} tests selected)",
            self.table.suite,
            self.tests.len(),
            self.table.tests.len()
        );

        let tests = std::mem::take(&mut self.tests);

        if !self.check_hook_shapes() {
            self.report_all(&tests, CallStatus::Missed);
        } else {
            match self.run_fixture(Role::SetUpSuite).await {
                None | Some(CallStatus::Succeeded) => self.run_tests(&tests).await,
                Some(CallStatus::Skipped) => self.report_all(&tests, CallStatus::Skipped),
                Some(_) => self.report_all(&tests, CallStatus::Missed),
            }
            self.run_fixture(Role::TearDownSuite).await;
        }

        let result = self.tracker.wait_and_stop().await;
        info!(
            "Finished {} in {:.3}s: {}",
            self.table.suite,
            timer.elapsed_secs(),
            result
        );
        result
    }

    /// Report a Panicked fixture call for every hook the engine cannot invoke
    fn check_hook_shapes(&self) -> bool {
        let mut well_shaped = true;
        for hook in self.table.hooks() {
            if let MethodBody::Misshapen { declared } = hook.body() {
                warn!("{} cannot be called: declared as {}", hook.info(), declared);
                let call = shape_error(hook.info(), CallKind::Fixture, declared);
                self.tracker.reporter().synthesized(call);
                well_shaped = false;
            }
        }
        well_shaped
    }

    async fn run_tests(&mut self, tests: &[Method<S>]) {
        for (i, test) in tests.iter().enumerate() {
            if self.suite.is_none() {
                self.report_all(&tests[i..], CallStatus::Missed);
                return;
            }

            match self.run_fixture(Role::SetUpTest).await {
                None | Some(CallStatus::Succeeded) => {}
                Some(CallStatus::Skipped) => {
                    self.report(test, CallStatus::Skipped, None);
                    continue;
                }
                Some(status) => {
                    let message = if status == CallStatus::Failed {
                        FIXTURE_FAILED
                    } else {
                        FIXTURE_PANICKED
                    };
                    self.report(test, CallStatus::FixturePanicked, Some(message));
                    self.run_fixture(Role::TearDownTest).await;
                    self.report_all(&tests[i + 1..], CallStatus::Missed);
                    return;
                }
            }

            self.dispatch(test.clone(), CallKind::Test).await;
            self.run_fixture(Role::TearDownTest).await;
        }
    }

    /// Run a lifecycle hook if one is registered
    async fn run_fixture(&mut self, role: Role) -> Option<CallStatus> {
        let hook = self.table.hook(role)?.clone();
        self.dispatch(hook, CallKind::Fixture).await
    }

    /// Run one call on a blocking worker and report it
    ///
    /// Returns the status as the tracker will count it, or `None` when the
    /// suite instance is gone and nothing ran.
    async fn dispatch(&mut self, method: Method<S>, kind: CallKind) -> Option<CallStatus> {
        let Some(mut suite) = self.suite.take() else {
            debug!("Not calling {}: suite instance was lost", method.info());
            return None;
        };

        let info = Arc::clone(method.info());
        self.tracker.reporter().begin(&info, kind);

        let joined = tokio::task::spawn_blocking(move || {
            let call = invoke(&mut suite, &method, kind);
            (suite, call)
        })
        .await;

        let call = match joined {
            Ok((suite, call)) => {
                self.suite = Some(suite);
                call
            }
            Err(e) => {
                error!("Worker running {} was lost: {}", info, e);
                Call::synthesized(
                    &info,
                    kind,
                    CallStatus::Panicked,
                    Some(&format!("... Panic: worker task lost: {e}")),
                )
            }
        };

        let status = call.reported_status();
        self.tracker.reporter().done(call);
        Some(status)
    }

    fn report(&self, test: &Method<S>, status: CallStatus, message: Option<&str>) {
        let call = Call::synthesized(test.info(), CallKind::Test, status, message);
        self.tracker.reporter().synthesized(call);
    }

    fn report_all(&self, tests: &[Method<S>], status: CallStatus) {
        for test in tests {
            self.report(test, status, None);
        }
    }
}
