//! Run result models
//!
//! Aggregate counters for one or more suite runs.

use serde::Serialize;
use std::fmt;
use std::ops::{Add, AddAssign};
use thiserror::Error;

use crate::filter::FilterError;
use crate::models::{CallKind, CallStatus};

/// Error terminating a run before any suite method executes
#[derive(Error, Clone, Debug, PartialEq)]
pub enum RunError {
    #[error("Bad filter expression: {0}")]
    BadFilter(#[from] FilterError),
}

/// Aggregated outcome of a run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunResult {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub panicked: usize,
    pub fixture_panicked: usize,
    pub missed: usize,
    /// When set, the counters carry no meaning
    #[serde(serialize_with = "serialize_run_error")]
    pub run_error: Option<RunError>,
}

fn serialize_run_error<S: serde::Serializer>(
    error: &Option<RunError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_error(error: RunError) -> Self {
        Self {
            run_error: Some(error),
            ..Self::default()
        }
    }

    /// Count one completed call
    ///
    /// Fixture successes and skips are not tests and count nowhere; a
    /// panicking fixture counts as a fixture panic.
    pub fn record(&mut self, kind: CallKind, status: CallStatus) {
        match (status, kind) {
            (CallStatus::Succeeded, CallKind::Test) => self.succeeded += 1,
            (CallStatus::Succeeded, CallKind::Fixture) => {}
            (CallStatus::Failed, _) => self.failed += 1,
            (CallStatus::Skipped, CallKind::Test) => self.skipped += 1,
            (CallStatus::Skipped, CallKind::Fixture) => {}
            (CallStatus::Panicked, CallKind::Test) => self.panicked += 1,
            (CallStatus::Panicked, CallKind::Fixture) => self.fixture_panicked += 1,
            (CallStatus::FixturePanicked, _) => self.fixture_panicked += 1,
            (CallStatus::Missed, _) => self.missed += 1,
        }
    }

    /// Merge another result into this one
    ///
    /// Counters add up; the first run error wins.
    pub fn add(&mut self, other: &RunResult) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.panicked += other.panicked;
        self.fixture_panicked += other.fixture_panicked;
        self.missed += other.missed;
        if self.run_error.is_none() {
            self.run_error = other.run_error.clone();
        }
    }

    /// True when nothing failed, panicked or was missed
    pub fn passed(&self) -> bool {
        self.failed == 0
            && self.panicked == 0
            && self.fixture_panicked == 0
            && self.missed == 0
            && self.run_error.is_none()
    }

    /// Number of test-kind outcomes recorded
    pub fn total(&self) -> usize {
        self.succeeded
            + self.failed
            + self.skipped
            + self.panicked
            + self.fixture_panicked
            + self.missed
    }
}

impl Add for RunResult {
    type Output = RunResult;

    fn add(mut self, other: RunResult) -> RunResult {
        RunResult::add(&mut self, &other);
        self
    }
}

impl AddAssign<&RunResult> for RunResult {
    fn add_assign(&mut self, other: &RunResult) {
        RunResult::add(self, other);
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.run_error {
            return write!(f, "ERROR: {error}");
        }
        let status = if self.passed() { "OK" } else { "OOPS" };
        write!(f, "{status}: {} passed", self.succeeded)?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.failed > 0 {
            write!(f, ", {} FAILED", self.failed)?;
        }
        if self.panicked > 0 {
            write!(f, ", {} PANICKED", self.panicked)?;
        }
        if self.fixture_panicked > 0 {
            write!(f, ", {} FIXTURE PANICKED", self.fixture_panicked)?;
        }
        if self.missed > 0 {
            write!(f, ", {} MISSED", self.missed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn sample(seed: usize) -> RunResult {
        RunResult {
            succeeded: seed,
            failed: seed + 1,
            skipped: seed * 2,
            panicked: seed % 3,
            fixture_panicked: seed + 4,
            missed: seed * 5,
            run_error: None,
        }
    }

    #[test]
    fn test_add_is_associative_and_commutative() {
        let (a, b, c) = (sample(1), sample(2), sample(7));

        let left = (a.clone() + b.clone()) + c.clone();
        let right = a.clone() + (b.clone() + c.clone());
        assert_eq!(left, right);

        assert_eq!(a.clone() + b.clone(), b + a);
    }

    #[test]
    fn test_add_keeps_first_error() {
        let error = Filter::compile("(").unwrap_err();
        let mut result = RunResult::new();
        result += &RunResult::from_error(RunError::from(error.clone()));
        result += &RunResult::new();
        assert_eq!(result.run_error, Some(RunError::BadFilter(error)));
    }

    #[test]
    fn test_record_counting() {
        let mut result = RunResult::new();
        result.record(CallKind::Test, CallStatus::Succeeded);
        result.record(CallKind::Fixture, CallStatus::Succeeded);
        result.record(CallKind::Fixture, CallStatus::Skipped);
        result.record(CallKind::Fixture, CallStatus::Panicked);
        result.record(CallKind::Test, CallStatus::Panicked);
        result.record(CallKind::Test, CallStatus::FixturePanicked);
        result.record(CallKind::Test, CallStatus::Missed);
        result.record(CallKind::Fixture, CallStatus::Failed);

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.panicked, 1);
        assert_eq!(result.fixture_panicked, 2);
        assert_eq!(result.missed, 1);
        assert_eq!(result.failed, 1);
    }

    #[test]
    fn test_summary_text() {
        let mut result = RunResult::new();
        result.succeeded = 2;
        assert!(result.passed());
        assert_eq!(result.to_string(), "OK: 2 passed");

        result.skipped = 1;
        result.failed = 3;
        result.missed = 1;
        assert!(!result.passed());
        assert_eq!(
            result.to_string(),
            "OOPS: 2 passed, 1 skipped, 3 FAILED, 1 MISSED"
        );

        result.panicked = 1;
        result.fixture_panicked = 2;
        assert_eq!(
            result.to_string(),
            "OOPS: 2 passed, 1 skipped, 3 FAILED, 1 PANICKED, 2 FIXTURE PANICKED, 1 MISSED"
        );
    }

    #[test]
    fn test_error_summary() {
        let error = Filter::compile("[").unwrap_err();
        let result = RunResult::from_error(error.into());
        assert!(!result.passed());
        assert!(result.to_string().starts_with("ERROR: Bad filter expression: "));
    }
}
