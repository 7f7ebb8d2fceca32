//! Renderable report records
//!
//! The stable record every output back end consumes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Call, CallKind, MethodInfo};

/// Label of a stream START line
pub const START_LABEL: &str = "START";

const UNKNOWN: &str = "<unknown>";

/// One reportable event: a started or completed call
#[derive(Clone, Debug, Serialize)]
pub struct RenderableEvent {
    /// PASS, FAIL, PANIC, SKIP, MISS or START
    pub label: &'static str,
    pub kind: CallKind,
    pub suite: String,
    pub test: String,
    pub file: String,
    pub line: u32,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_failure: Option<String>,
}

impl RenderableEvent {
    /// Event for a completed call
    pub fn from_call(call: &Call) -> Self {
        let method = call.method();
        let (suite, test, file, line) = match method.as_deref() {
            Some(info) => (
                info.suite.clone(),
                info.name.clone(),
                info.location.file.to_string(),
                info.location.line,
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string(), UNKNOWN.to_string(), 0),
        };

        Self {
            label: call.status.label(),
            kind: call.kind,
            suite,
            test,
            file,
            line,
            started_at: call.started_at,
            duration_secs: call.duration.as_secs_f64(),
            log: call.log.clone(),
            expected_failure: call.expected_failure.clone(),
        }
    }

    /// Event announcing a call about to run
    pub fn started(info: &MethodInfo, kind: CallKind) -> Self {
        Self {
            label: START_LABEL,
            kind,
            suite: info.suite.clone(),
            test: info.name.clone(),
            file: info.location.file.to_string(),
            line: info.location.line,
            started_at: Utc::now(),
            duration_secs: 0.0,
            log: String::new(),
            expected_failure: None,
        }
    }

    /// "Suite.test"
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.suite, self.test)
    }

    /// "file:line"
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}
