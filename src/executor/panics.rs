//! Panic isolation at the call boundary
//!
//! Worker threads running suite methods flag themselves as capturing. While
//! the flag is set, the process-wide panic hook records the panic message,
//! location and backtrace in a thread-local slot instead of printing them.
//! Threads that are not capturing fall through to the previously installed
//! hook.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Once;

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Boundary frame; traces never reach past it
const BOUNDARY: &str = "executor::panics::run_guarded";

/// Frames raising the panic and running the hook, above the faulting code
const RAISING: &[&str] = &[
    "std::backtrace",
    "std::sys::backtrace",
    "PanicReport",
    "executor::panics::install_hook",
    "std::panicking::begin_panic",
    "std::panicking::rust_panic_with_hook",
    "rust_begin_unwind",
    "core::panicking::",
];

/// Frames of the catching machinery, below the faulting code
const CATCHING: &[&str] = &[
    "std::panicking::try",
    "std::panicking::catch_unwind",
    "std::panic::catch_unwind",
    "__rust_try",
    "AssertUnwindSafe",
];

/// Everything known about one captured panic
#[derive(Clone, Debug, Default)]
pub struct PanicReport {
    pub message: String,
    pub location: Option<String>,
    pub trace: Vec<String>,
}

impl PanicReport {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        let message = payload_message(info.payload())
            .unwrap_or_else(|| "<non-text panic value>".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        let backtrace = Backtrace::force_capture().to_string();

        Self {
            message,
            location,
            trace: trim_trace(&backtrace),
        }
    }

    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        Self {
            message: payload_message(payload)
                .unwrap_or_else(|| "<non-text panic value>".to_string()),
            location: None,
            trace: Vec::new(),
        }
    }
}

impl fmt::Display for PanicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "... Panic: {}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " (at {location})")?;
        }
        writeln!(f)?;
        if !self.trace.is_empty() {
            writeln!(f)?;
            for frame in &self.trace {
                writeln!(f, "{frame}")?;
            }
        }
        Ok(())
    }
}

/// Text carried by a panic payload, if any
pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        Some((*s).to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}

/// Install the capturing hook once per process
pub fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let report = PanicReport::capture(info);
                LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(report));
            } else {
                previous(info);
            }
        }));
    });
}

/// Restores the capture flag on drop, including during unwinding
struct CaptureGuard {
    previous: bool,
}

impl CaptureGuard {
    fn enable() -> Self {
        let previous = CAPTURING.with(|c| c.replace(true));
        Self { previous }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(self.previous));
    }
}

/// Run `f`, converting a panic into a [`PanicReport`]
///
/// This is the dispatch boundary: captured traces stop at this frame.
#[inline(never)]
pub fn run_guarded<R>(f: impl FnOnce() -> R) -> Result<R, PanicReport> {
    install_hook();
    LAST_PANIC.with(|slot| slot.borrow_mut().take());

    let outcome = {
        let _guard = CaptureGuard::enable();
        panic::catch_unwind(AssertUnwindSafe(f))
    };

    outcome.map_err(|payload| {
        LAST_PANIC
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| PanicReport::from_payload(payload.as_ref()))
    })
}

/// Call `f` and hand back its panic payload without printing anything
pub(crate) fn catch_quietly(f: &dyn Fn()) -> Result<(), Box<dyn Any + Send>> {
    install_hook();
    let _guard = CaptureGuard::enable();
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    LAST_PANIC.with(|slot| slot.borrow_mut().take());
    outcome
}

/// Backtrace frames open with an index: "  12: path::to::function"
fn is_frame_start(line: &str) -> bool {
    line.trim_start()
        .split_once(':')
        .map_or(false, |(index, _)| {
            !index.is_empty() && index.chars().all(|c| c.is_ascii_digit())
        })
}

fn frame_matches(frame: &[&str], markers: &[&str]) -> bool {
    markers.iter().any(|m| frame[0].contains(m))
}

/// Keep the frames from the faulting code down to the catch point
///
/// Raising frames sit above the faulting code and catching frames below it,
/// so the cut points are the last raising frame and the first catching frame
/// after it.
fn trim_trace(backtrace: &str) -> Vec<String> {
    let mut frames: Vec<Vec<&str>> = Vec::new();
    for line in backtrace.lines() {
        if is_frame_start(line) {
            frames.push(vec![line]);
        } else if let Some(frame) = frames.last_mut() {
            frame.push(line);
        }
    }

    let boundary = frames
        .iter()
        .position(|frame| frame_matches(frame, &[BOUNDARY]))
        .unwrap_or(frames.len());
    let start = frames[..boundary]
        .iter()
        .rposition(|frame| frame_matches(frame, RAISING))
        .map_or(0, |i| i + 1);
    let end = frames[start..boundary]
        .iter()
        .position(|frame| frame_matches(frame, CATCHING))
        .map_or(boundary, |i| start + i);

    frames[start..end]
        .iter()
        .flat_map(|frame| frame.iter().map(|line| line.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_guarded_passes_value_through() {
        assert_eq!(run_guarded(|| 21 * 2).unwrap(), 42);
    }

    #[test]
    fn test_run_guarded_captures_panic() {
        let report = run_guarded(|| panic!("kaboom {}", 7)).unwrap_err();
        assert_eq!(report.message, "kaboom 7");
        assert!(report.location.unwrap().contains("panics.rs"));
        assert!(!CAPTURING.with(Cell::get));
    }

    #[test]
    fn test_catch_quietly() {
        let payload = catch_quietly(&|| panic!("quiet")).unwrap_err();
        assert_eq!(payload_message(payload.as_ref()).as_deref(), Some("quiet"));
        assert!(catch_quietly(&|| {}).is_ok());
    }

    #[test]
    fn test_non_text_payload() {
        let report = run_guarded(|| std::panic::panic_any(5u8)).unwrap_err();
        assert_eq!(report.message, "<non-text panic value>");
    }

    #[test]
    fn test_trim_trace() {
        let trace = "\
   0: std::backtrace::Backtrace::force_capture
             at /rustc/library/std/src/backtrace.rs:1
   1: suitecheck::executor::panics::PanicReport::capture
   2: suitecheck::executor::panics::install_hook::{{closure}}
   3: std::panicking::rust_panic_with_hook
   4: std::panicking::begin_panic_handler::{{closure}}
   5: std::sys::backtrace::__rust_end_short_backtrace
   6: rust_begin_unwind
   7: core::panicking::panic_fmt
   8: demo::Store::flush
             at src/store.rs:40:13
   9: demo::test_flush::{{closure}}
             at src/demo.rs:10:9
  10: <core::panic::unwind_safe::AssertUnwindSafe<F> as core::ops::function::FnOnce<()>>::call_once
  11: std::panicking::try::do_call
  12: __rust_try
  13: std::panicking::try
  14: std::panic::catch_unwind
  15: suitecheck::executor::panics::run_guarded
  16: main";
        let frames = trim_trace(trace);
        assert_eq!(
            frames,
            vec![
                "   8: demo::Store::flush".to_string(),
                "             at src/store.rs:40:13".to_string(),
                "   9: demo::test_flush::{{closure}}".to_string(),
                "             at src/demo.rs:10:9".to_string(),
            ]
        );
    }

    #[test]
    fn test_trim_trace_without_markers() {
        let frames = trim_trace("   0: a::b\n   1: c::d");
        assert_eq!(frames, vec!["   0: a::b".to_string(), "   1: c::d".to_string()]);
    }

    #[inline(never)]
    fn overheat_sensor() {
        panic!("sensor overheated");
    }

    #[test]
    fn test_captured_trace_keeps_faulting_frame() {
        let report = run_guarded(overheat_sensor).unwrap_err();
        assert!(
            report.trace.iter().any(|line| line.contains("overheat_sensor")),
            "{:#?}",
            report.trace
        );
        assert!(!report.trace.iter().any(|line| line.contains("catch_unwind")));
        assert!(!report.trace.iter().any(|line| line.contains("rust_panic_with_hook")));
    }

    #[test]
    fn test_report_display() {
        let report = PanicReport {
            message: "boom".to_string(),
            location: Some("src/a.rs:1:2".to_string()),
            trace: vec!["   2: a::b".to_string()],
        };
        assert_eq!(report.to_string(), "... Panic: boom (at src/a.rs:1:2)\n\n   2: a::b\n");
    }
}
