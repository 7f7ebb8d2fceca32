//! Result tracking
//!
//! A dedicated task owns the run counters and the report sink. Calls are
//! announced on one channel when they start and delivered on another when
//! they complete; a stop request is honoured only once every announced call
//! has completed.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::models::{Call, CallKind, MethodInfo, RunResult};
use crate::output::{OutputSink, ResultFormatter};

/// Start signal for one call
#[derive(Debug)]
struct Begin {
    info: Arc<MethodInfo>,
    kind: CallKind,
    /// Whether stream mode should print a START line
    announce: bool,
}

/// Sending half used by the runner
#[derive(Clone, Debug)]
pub(crate) struct CallReporter {
    begin_tx: mpsc::UnboundedSender<Begin>,
    done_tx: mpsc::UnboundedSender<Call>,
}

impl CallReporter {
    /// A call is about to be dispatched
    pub(crate) fn begin(&self, info: &Arc<MethodInfo>, kind: CallKind) {
        self.send_begin(info, kind, true);
    }

    /// A dispatched call has completed
    pub(crate) fn done(&self, call: Call) {
        if self.done_tx.send(call).is_err() {
            warn!("Result tracker is gone, dropping call");
        }
    }

    /// A call that never ran, such as a missed test
    pub(crate) fn synthesized(&self, call: Call) {
        if let Some(info) = call.method() {
            self.send_begin(&info, call.kind, false);
        }
        self.done(call);
    }

    fn send_begin(&self, info: &Arc<MethodInfo>, kind: CallKind, announce: bool) {
        let begin = Begin {
            info: Arc::clone(info),
            kind,
            announce,
        };
        if self.begin_tx.send(begin).is_err() {
            warn!("Result tracker is gone, dropping start of {}", info);
        }
    }
}

/// Counting and rendering state, owned by the tracker task
pub(crate) struct TrackerState {
    result: RunResult,
    formatter: ResultFormatter,
    sink: OutputSink,
    outstanding: usize,
}

impl TrackerState {
    pub(crate) fn new(formatter: ResultFormatter, sink: OutputSink) -> Self {
        Self {
            result: RunResult::new(),
            formatter,
            sink,
            outstanding: 0,
        }
    }

    fn begin(&mut self, begin: Begin) {
        self.outstanding += 1;
        if begin.announce {
            if let Some(text) = self.formatter.format_start(&begin.info, begin.kind) {
                self.sink.emit(&text);
            }
        }
    }

    /// Count and render one completed call
    pub(crate) fn record(&mut self, mut call: Call) {
        self.outstanding = self.outstanding.saturating_sub(1);
        call.invert_expected_failure();
        self.result.record(call.kind, call.status);
        if let Some(text) = self.formatter.format_call(&call) {
            self.sink.emit(&text);
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub(crate) fn result(&self) -> &RunResult {
        &self.result
    }

    fn into_result(self) -> RunResult {
        self.result
    }
}

/// Handle to a running tracker task
pub(crate) struct ResultTracker {
    reporter: CallReporter,
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<RunResult>,
}

impl ResultTracker {
    /// Spawn the tracker task
    pub(crate) fn start(formatter: ResultFormatter, sink: OutputSink) -> Self {
        let (begin_tx, begin_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let state = TrackerState::new(formatter, sink);
        let handle = tokio::spawn(track(state, begin_rx, done_rx, stop_rx));

        Self {
            reporter: CallReporter { begin_tx, done_tx },
            stop_tx,
            handle,
        }
    }

    pub(crate) fn reporter(&self) -> &CallReporter {
        &self.reporter
    }

    /// Wait for every announced call to complete, then stop and return the
    /// counters
    pub(crate) async fn wait_and_stop(self) -> RunResult {
        let _ = self.stop_tx.send(());
        drop(self.reporter);
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                error!("Result tracker task failed: {}", e);
                RunResult::new()
            }
        }
    }
}

async fn track(
    mut state: TrackerState,
    mut begins: mpsc::UnboundedReceiver<Begin>,
    mut dones: mpsc::UnboundedReceiver<Call>,
    mut stop: oneshot::Receiver<()>,
) -> RunResult {
    loop {
        let outstanding = state.outstanding();
        tokio::select! {
            biased;

            Some(begin) = begins.recv() => state.begin(begin),
            Some(call) = dones.recv() => state.record(call),
            _ = &mut stop, if outstanding == 0 => break,
            else => {
                if state.outstanding() > 0 {
                    warn!("{} calls never completed", state.outstanding());
                }
                break;
            }
        }
    }
    state.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallStatus, Role, SourceLocation};
    use crate::output::{OutputFormat, SharedBuffer};

    fn info(role: Role, name: &str) -> Arc<MethodInfo> {
        Arc::new(MethodInfo {
            suite: "Track".to_string(),
            name: name.to_string(),
            role,
            location: SourceLocation {
                file: "track.rs",
                line: 9,
            },
        })
    }

    #[test]
    fn test_record_counts_and_renders() {
        let buffer = SharedBuffer::new();
        let mut state = TrackerState::new(ResultFormatter::new(OutputFormat::Text), buffer.sink());
        let test = info(Role::Test, "test_a");
        let fixture = info(Role::SetUpTest, "set_up_test");

        state.record(Call::new(&test, CallKind::Test, CallStatus::Succeeded));
        state.record(Call::new(&fixture, CallKind::Fixture, CallStatus::Succeeded));
        assert!(buffer.is_empty());

        state.record(Call::new(&fixture, CallKind::Fixture, CallStatus::Panicked));
        state.record(Call::new(&test, CallKind::Test, CallStatus::FixturePanicked));
        assert_eq!(state.result().succeeded, 1);
        assert_eq!(state.result().fixture_panicked, 2);
        assert!(buffer.contents().contains("PANIC: track.rs:9: Track.set_up_test"));
        assert!(buffer.contents().contains("PANIC: track.rs:9: Track.test_a"));
    }

    #[test]
    fn test_record_applies_expected_failure() {
        let buffer = SharedBuffer::new();
        let mut state = TrackerState::new(ResultFormatter::new(OutputFormat::Text), buffer.sink());
        let test = info(Role::Test, "test_known_bug");

        let mut call = Call::new(&test, CallKind::Test, CallStatus::Failed);
        call.expected_failure = Some("issue 7".to_string());
        state.record(call);
        assert_eq!(state.result().succeeded, 1);
        assert!(buffer.is_empty());

        let mut call = Call::new(&test, CallKind::Test, CallStatus::Succeeded);
        call.expected_failure = Some("issue 7".to_string());
        state.record(call);
        assert_eq!(state.result().failed, 1);
        assert!(buffer.contents().contains("Reason: issue 7"));
    }

    #[tokio::test]
    async fn test_tracker_drains_before_stopping() {
        let buffer = SharedBuffer::new();
        let formatter = ResultFormatter::new(OutputFormat::Text).stream(true);
        let tracker = ResultTracker::start(formatter, buffer.sink());
        let test = info(Role::Test, "test_a");

        let reporter = tracker.reporter().clone();
        reporter.begin(&test, CallKind::Test);
        let late = tokio::spawn(async move {
            tokio::task::yield_now().await;
            reporter.done(Call::new(&test, CallKind::Test, CallStatus::Succeeded));
            test
        });

        let result = tracker.wait_and_stop().await;
        let _test = late.await.unwrap();
        assert_eq!(result.succeeded, 1);
        assert_eq!(
            buffer.lines(),
            vec![
                "START: track.rs:9: Track.test_a".to_string(),
                "PASS: track.rs:9: Track.test_a\t0.000s".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_synthesized_calls_are_quiet_in_stream_mode() {
        let buffer = SharedBuffer::new();
        let formatter = ResultFormatter::new(OutputFormat::Text).stream(true);
        let tracker = ResultTracker::start(formatter, buffer.sink());
        let test = info(Role::Test, "test_b");

        tracker
            .reporter()
            .synthesized(Call::new(&test, CallKind::Test, CallStatus::Missed));
        let result = tracker.wait_and_stop().await;
        assert_eq!(result.missed, 1);
        assert_eq!(buffer.lines().len(), 1);
        assert!(buffer.lines()[0].starts_with("MISS: "));
    }
}
