//! Call models
//!
//! A call is one tracked invocation of a fixture or test method.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::models::MethodInfo;

/// Kind of work a call represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Fixture,
    Test,
}

/// Final status of a call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Succeeded,
    Failed,
    Skipped,
    Panicked,
    /// Test whose `set_up_test` failed or panicked; the body never ran
    FixturePanicked,
    /// Test never invoked because an earlier fixture broke the run
    Missed,
}

impl CallStatus {
    /// Report label
    pub fn label(&self) -> &'static str {
        match self {
            CallStatus::Succeeded => "PASS",
            CallStatus::Failed => "FAIL",
            CallStatus::Skipped => "SKIP",
            CallStatus::Panicked | CallStatus::FixturePanicked => "PANIC",
            CallStatus::Missed => "MISS",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallStatus::Succeeded)
    }

    /// Failures and panics, the statuses reported even in quiet mode
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            CallStatus::Failed | CallStatus::Panicked | CallStatus::FixturePanicked
        )
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A completed call, handed to the tracker by value
#[derive(Clone, Debug)]
pub struct Call {
    pub kind: CallKind,
    pub status: CallStatus,
    pub log: String,
    pub expected_failure: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    method: Weak<MethodInfo>,
}

impl Call {
    pub(crate) fn new(method: &Arc<MethodInfo>, kind: CallKind, status: CallStatus) -> Self {
        Self {
            kind,
            status,
            log: String::new(),
            expected_failure: None,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            method: Arc::downgrade(method),
        }
    }

    /// A call assigned a status without ever running
    pub(crate) fn synthesized(
        method: &Arc<MethodInfo>,
        kind: CallKind,
        status: CallStatus,
        message: Option<&str>,
    ) -> Self {
        let mut call = Self::new(method, kind, status);
        if let Some(message) = message {
            call.append_log(message);
        }
        call
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    /// Append one line, terminating it with a newline
    pub fn append_log(&mut self, line: &str) {
        self.log.push_str(line);
        if !line.ends_with('\n') {
            self.log.push('\n');
        }
    }

    /// Metadata of the originating method, if it is still alive
    pub fn method(&self) -> Option<Arc<MethodInfo>> {
        self.method.upgrade()
    }

    /// Status after expected-failure inversion, without applying it
    pub fn reported_status(&self) -> CallStatus {
        match (self.expected_failure.is_some(), self.status) {
            (true, CallStatus::Failed) => CallStatus::Succeeded,
            (true, CallStatus::Succeeded) => CallStatus::Failed,
            (_, status) => status,
        }
    }

    /// Apply expected-failure inversion
    ///
    /// Returns true when the status was changed.
    pub fn invert_expected_failure(&mut self) -> bool {
        let inverted = self.reported_status();
        if inverted == self.status {
            return false;
        }
        if inverted == CallStatus::Failed {
            let reason = self.expected_failure.clone().unwrap_or_default();
            self.append_log("Error: Test succeeded, but was expected to fail");
            self.append_log(&format!("Reason: {reason}"));
        }
        self.status = inverted;
        true
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .method()
            .map(|m| m.qualified_name())
            .unwrap_or_else(|| "<unknown>".to_string());
        write!(
            f,
            "{} {} [{}ms]",
            self.status,
            name,
            self.duration.as_millis()
        )
    }
}
