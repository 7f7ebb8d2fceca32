//! Output formatters for call events
//!
//! Provides plain text, JSON lines and CI service-message output.

use serde::Serialize;

use super::event::RenderableEvent;
use crate::models::{Call, CallKind, MethodInfo, RunResult};

/// Width of the rule framing failure blocks
const RULE_WIDTH: usize = 70;

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    CiEvent,
}

impl OutputFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "default" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "ci-event" | "teamcity" => Some(OutputFormat::CiEvent),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::CiEvent => "ci-event",
        }
    }
}

/// Result formatter
#[derive(Clone, Debug, Default)]
pub struct ResultFormatter {
    format: OutputFormat,
    verbose: bool,
    stream: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            verbose: false,
            stream: false,
        }
    }

    /// Also report passed, skipped and missed tests
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Report calls as they start; implies verbose
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn is_verbose(&self) -> bool {
        self.verbose || self.stream
    }

    /// Whether a completed call produces output at all
    pub fn shows(&self, call: &Call) -> bool {
        if call.status.is_problem() {
            return true;
        }
        call.kind == CallKind::Test && self.is_verbose()
    }

    /// Output for a test about to start, in stream mode only
    ///
    /// Fixture starts stay quiet: their successes never render, so a START
    /// line would have no completion line to pair with.
    pub fn format_start(&self, info: &MethodInfo, kind: CallKind) -> Option<String> {
        if !self.stream || kind == CallKind::Fixture {
            return None;
        }
        let event = RenderableEvent::started(info, kind);
        match self.format {
            OutputFormat::Text => Some(format!(
                "{}: {}: {}\n",
                event.label,
                event.location(),
                event.qualified_name()
            )),
            OutputFormat::Json => Some(json_line(&event)),
            // testStarted is emitted together with the outcome
            OutputFormat::CiEvent => None,
        }
    }

    /// Output for a completed call, if the render policy shows it
    pub fn format_call(&self, call: &Call) -> Option<String> {
        if !self.shows(call) {
            return None;
        }
        Some(self.format_event(&RenderableEvent::from_call(call)))
    }

    /// Render one event
    pub fn format_event(&self, event: &RenderableEvent) -> String {
        match self.format {
            OutputFormat::Text => format_event_text(event),
            OutputFormat::Json => json_line(event),
            OutputFormat::CiEvent => format_event_ci(event),
        }
    }

    /// Render the closing summary
    pub fn format_summary(&self, result: &RunResult) -> String {
        match self.format {
            OutputFormat::Text => format!("{result}\n"),
            OutputFormat::Json => {
                #[derive(Serialize)]
                struct SummaryJson<'a> {
                    summary: String,
                    passed: bool,
                    #[serde(flatten)]
                    result: &'a RunResult,
                }

                json_line(&SummaryJson {
                    summary: result.to_string(),
                    passed: result.passed(),
                    result,
                })
            }
            OutputFormat::CiEvent => {
                let status = if result.passed() { "NORMAL" } else { "FAILURE" };
                format!(
                    "##teamcity[message text='{}' status='{}']\n",
                    escape_ci(&result.to_string()),
                    status
                )
            }
        }
    }
}

fn json_line<T: Serialize>(value: &T) -> String {
    let mut line = serde_json::to_string(value).unwrap_or_default();
    line.push('\n');
    line
}

fn is_problem_label(label: &str) -> bool {
    matches!(label, "FAIL" | "PANIC")
}

fn format_event_text(event: &RenderableEvent) -> String {
    if is_problem_label(event.label) {
        let mut output = format!(
            "\n{}\n{}: {}: {}\n\n{}",
            "-".repeat(RULE_WIDTH),
            event.label,
            event.location(),
            event.qualified_name(),
            event.log
        );
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output
    } else {
        format!(
            "{}: {}: {}\t{:.3}s\n",
            event.label,
            event.location(),
            event.qualified_name(),
            event.duration_secs
        )
    }
}

/// Escape a value for a TeamCity service message
fn escape_ci(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\'' => escaped.push_str("|'"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_event_ci(event: &RenderableEvent) -> String {
    let name = escape_ci(&event.qualified_name());
    let mut output = format!("##teamcity[testStarted name='{name}' captureStandardOutput='false']\n");

    match event.label {
        "FAIL" | "PANIC" => {
            output.push_str(&format!(
                "##teamcity[testFailed name='{}' message='{}' details='{}']\n",
                name,
                event.label,
                escape_ci(&event.log)
            ));
        }
        "SKIP" | "MISS" => {
            output.push_str(&format!(
                "##teamcity[testIgnored name='{}' message='{}']\n",
                name, event.label
            ));
        }
        _ => {}
    }

    output.push_str(&format!(
        "##teamcity[testFinished name='{}' duration='{}']\n",
        name,
        (event.duration_secs * 1000.0).round() as u64
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallStatus, Role, SourceLocation};
    use std::sync::Arc;

    fn info(role: Role, name: &str) -> Arc<MethodInfo> {
        Arc::new(MethodInfo {
            suite: "Net".to_string(),
            name: name.to_string(),
            role,
            location: SourceLocation {
                file: "tests/net.rs",
                line: 7,
            },
        })
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("PLAIN"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("default"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("teamcity"), Some(OutputFormat::CiEvent));
        assert_eq!(OutputFormat::from_str("unknown"), None);
        assert_eq!(OutputFormat::CiEvent.name(), "ci-event");
    }

    #[test]
    fn test_failure_block() {
        let info = info(Role::Test, "test_dial");
        let call = Call::new(&info, CallKind::Test, CallStatus::Failed).with_log("refused\n");
        let output = ResultFormatter::new(OutputFormat::Text)
            .format_call(&call)
            .unwrap();
        let expected = format!(
            "\n{}\nFAIL: tests/net.rs:7: Net.test_dial\n\nrefused\n",
            "-".repeat(70)
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_render_policy() {
        let test = info(Role::Test, "test_dial");
        let fixture = info(Role::SetUpTest, "set_up_test");
        let quiet = ResultFormatter::new(OutputFormat::Text);
        let verbose = ResultFormatter::new(OutputFormat::Text).verbose(true);

        let pass = Call::new(&test, CallKind::Test, CallStatus::Succeeded);
        let miss = Call::new(&test, CallKind::Test, CallStatus::Missed);
        let fixture_pass = Call::new(&fixture, CallKind::Fixture, CallStatus::Succeeded);
        let fixture_panic = Call::new(&fixture, CallKind::Fixture, CallStatus::Panicked);

        assert!(quiet.format_call(&pass).is_none());
        assert!(quiet.format_call(&miss).is_none());
        assert!(quiet.format_call(&fixture_panic).is_some());
        assert!(verbose.format_call(&fixture_pass).is_none());

        let line = verbose.format_call(&pass).unwrap();
        assert!(line.starts_with("PASS: tests/net.rs:7: Net.test_dial\t"));
        assert!(line.ends_with("s\n"));
        assert!(verbose
            .format_call(&miss)
            .unwrap()
            .starts_with("MISS: tests/net.rs:7: Net.test_dial"));
    }

    #[test]
    fn test_stream_start_lines() {
        let test = info(Role::Test, "test_dial");
        let stream = ResultFormatter::new(OutputFormat::Text).stream(true);
        assert_eq!(
            stream.format_start(&test, CallKind::Test).unwrap(),
            "START: tests/net.rs:7: Net.test_dial\n"
        );
        assert!(ResultFormatter::new(OutputFormat::Text)
            .format_start(&test, CallKind::Test)
            .is_none());

        let pass = Call::new(&test, CallKind::Test, CallStatus::Succeeded);
        assert!(stream.format_call(&pass).is_some());
    }

    #[test]
    fn test_stream_fixture_start_is_quiet() {
        let fixture = info(Role::SetUpTest, "set_up_test");
        let stream = ResultFormatter::new(OutputFormat::Text).stream(true);
        assert!(stream.format_start(&fixture, CallKind::Fixture).is_none());

        let pass = Call::new(&fixture, CallKind::Fixture, CallStatus::Succeeded);
        assert!(stream.format_call(&pass).is_none());
    }

    #[test]
    fn test_json_lines() {
        let test = info(Role::Test, "test_dial");
        let formatter = ResultFormatter::new(OutputFormat::Json).verbose(true);
        let call = Call::new(&test, CallKind::Test, CallStatus::Skipped);
        let line = formatter.format_call(&call).unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["label"], "SKIP");
        assert_eq!(value["suite"], "Net");
        assert_eq!(value["test"], "test_dial");
        assert_eq!(value["line"], 7);
    }

    #[test]
    fn test_json_summary() {
        let result = RunResult {
            succeeded: 3,
            failed: 1,
            ..Default::default()
        };
        let line = ResultFormatter::new(OutputFormat::Json).format_summary(&result);
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["summary"], "OOPS: 3 passed, 1 FAILED");
        assert_eq!(value["passed"], false);
        assert_eq!(value["succeeded"], 3);
        assert_eq!(value["failed"], 1);
    }

    #[test]
    fn test_ci_messages() {
        assert_eq!(escape_ci("a|b'c\n[d]"), "a||b|'c|n|[d|]");

        let test = info(Role::Test, "test_dial");
        let call = Call::new(&test, CallKind::Test, CallStatus::Panicked).with_log("boom\n");
        let output = ResultFormatter::new(OutputFormat::CiEvent)
            .format_call(&call)
            .unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("##teamcity[testStarted name='Net.test_dial'"));
        assert_eq!(
            lines[1],
            "##teamcity[testFailed name='Net.test_dial' message='PANIC' details='boom|n']"
        );
        assert_eq!(
            lines[2],
            "##teamcity[testFinished name='Net.test_dial' duration='0']"
        );
    }
}
