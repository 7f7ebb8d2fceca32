//! Per-call context
//!
//! The context every fixture and test receives. It accumulates the call log,
//! failure and skip flags, and hosts the `check`/`assert` entry points of the
//! checker protocol.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};
use std::panic::Location;
use std::sync::Arc;

use crate::check::{Checker, Value};
use crate::models::{Call, CallKind, CallStatus, MethodInfo, Stop};
use crate::utils::Timer;

/// Mutable state of a running call
pub struct CallContext {
    method: Arc<MethodInfo>,
    kind: CallKind,
    log: String,
    failed: bool,
    skipped: bool,
    reason: Option<String>,
    expected_failure: Option<String>,
    started_at: DateTime<Utc>,
    timer: Timer,
}

impl CallContext {
    pub(crate) fn new(method: &Arc<MethodInfo>, kind: CallKind) -> Self {
        Self {
            method: Arc::clone(method),
            kind,
            log: String::new(),
            failed: false,
            skipped: false,
            reason: None,
            expected_failure: None,
            started_at: Utc::now(),
            timer: Timer::start(method.qualified_name()),
        }
    }

    pub fn suite_name(&self) -> &str {
        &self.method.suite
    }

    pub fn method_name(&self) -> &str {
        &self.method.name
    }

    /// "Suite.method"
    pub fn test_name(&self) -> String {
        self.method.qualified_name()
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Everything logged so far
    pub fn output(&self) -> &str {
        &self.log
    }

    /// Append a line to the call log
    pub fn log(&mut self, message: impl fmt::Display) {
        let _ = writeln!(self.log, "{message}");
    }

    pub fn fail(&mut self) {
        self.failed = true;
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Mark the call failed and stop it
    pub fn fail_now(&mut self) -> Stop {
        self.fail();
        Stop
    }

    /// Log a message and mark the call failed
    #[track_caller]
    pub fn error(&mut self, message: impl fmt::Display) {
        self.log_caller(Location::caller());
        self.log(format_args!("... Error: {message}"));
        self.fail();
    }

    /// Log a message, mark the call failed and stop it
    #[track_caller]
    pub fn fatal(&mut self, message: impl fmt::Display) -> Stop {
        self.error(message);
        Stop
    }

    /// Clear a previously flagged failure
    pub fn succeed(&mut self) {
        self.failed = false;
    }

    pub fn succeed_now(&mut self) -> Stop {
        self.succeed();
        Stop
    }

    /// Skip the call with a reason
    pub fn skip(&mut self, reason: impl fmt::Display) -> Stop {
        let reason = reason.to_string();
        self.log(format_args!("... Skipped: {reason}"));
        self.skipped = true;
        self.reason = Some(reason);
        Stop
    }

    pub fn skipped(&self) -> bool {
        self.skipped
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Require the call to fail; the outcome is inverted when reported
    pub fn expect_failure(&mut self, reason: impl fmt::Display) {
        self.expected_failure = Some(reason.to_string());
    }

    /// Evaluate a checker; failure is logged and flagged but the call goes on
    #[track_caller]
    pub fn check(
        &mut self,
        obtained: &dyn Value,
        checker: &dyn Checker,
        args: &[&dyn Value],
    ) -> bool {
        self.internal_check("Check", Location::caller(), obtained, checker, args)
    }

    /// Evaluate a checker; failure also stops the call
    #[track_caller]
    pub fn assert(
        &mut self,
        obtained: &dyn Value,
        checker: &dyn Checker,
        args: &[&dyn Value],
    ) -> Result<(), Stop> {
        if self.internal_check("Assert", Location::caller(), obtained, checker, args) {
            Ok(())
        } else {
            Err(Stop)
        }
    }

    fn log_caller(&mut self, location: &Location<'_>) {
        self.log(format_args!("{}:{}:", location.file(), location.line()));
    }

    fn internal_check(
        &mut self,
        func: &str,
        location: &Location<'_>,
        obtained: &dyn Value,
        checker: &dyn Checker,
        args: &[&dyn Value],
    ) -> bool {
        let info = checker.info();

        let (args, comment) = match args.split_last() {
            Some((last, rest)) if last.as_comment().is_some() => (rest, last.as_comment()),
            _ => (args, None),
        };

        let mut params: Vec<&dyn Value> = Vec::with_capacity(args.len() + 1);
        params.push(obtained);
        params.extend_from_slice(args);

        if params.len() != info.arity() {
            self.log_caller(location);
            self.log(format_args!(
                "... Wrong number of parameters for {}: want {}, got {}",
                info.name,
                info.arity(),
                params.len()
            ));
            self.fail();
            return false;
        }

        let (ok, diagnostic) = checker.check(&params);
        if ok {
            return true;
        }

        self.log_caller(location);
        self.log(format_args!("... {func}({}) failed", info.name));
        for (label, value) in info.params.iter().zip(&params) {
            self.log(format_args!(
                "... {label} {} = {:?}",
                value.type_name(),
                value
            ));
        }
        if !diagnostic.is_empty() {
            self.log(format_args!("... {diagnostic}"));
        }
        if let Some(comment) = comment {
            self.log(format_args!("... {comment}"));
        }
        self.fail();
        false
    }

    /// Log the message of a body that escaped with a panic
    pub(crate) fn log_panic(&mut self, report: &impl fmt::Display) {
        self.log.push_str(&report.to_string());
    }

    /// Log the shape mismatch of a method the engine cannot invoke
    pub(crate) fn log_arg_panic(&mut self) {
        let message = format!(
            "... Panic: {} argument should be &mut CallContext",
            self.method
        );
        self.log(message);
    }

    /// Status implied by the flags when the body returned normally
    pub(crate) fn settled_status(&self) -> CallStatus {
        if self.skipped {
            CallStatus::Skipped
        } else if self.failed {
            CallStatus::Failed
        } else {
            CallStatus::Succeeded
        }
    }

    /// Close the context into a reportable call
    pub(crate) fn finish(self, status: CallStatus) -> Call {
        let duration = self.timer.stop();
        let mut call = Call::new(&self.method, self.kind, status).with_log(self.log);
        call.expected_failure = self.expected_failure;
        call.started_at = self.started_at;
        call.duration = duration;
        call
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("method", &self.method.qualified_name())
            .field("kind", &self.kind)
            .field("failed", &self.failed)
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Non-fatal check: `check!(c, obtained, Checker, args...)`
#[macro_export]
macro_rules! check {
    ($c:expr, $obtained:expr, $checker:expr $(, $arg:expr)* $(,)?) => {
        $c.check(&$obtained, &$checker, &[$(&$arg),*])
    };
}

/// Fatal check: `assert_that!(c, obtained, Checker, args...)?`
#[macro_export]
macro_rules! assert_that {
    ($c:expr, $obtained:expr, $checker:expr $(, $arg:expr)* $(,)?) => {
        $c.assert(&$obtained, &$checker, &[$(&$arg),*])
    };
}
