//! suitecheck - fixture-aware test suite execution engine
//!
//! Suites are plain Rust values whose type registers its lifecycle hooks and
//! tests once. The engine runs every selected test in order, each call on a
//! worker behind a panic boundary, and reports outcomes as they complete.
//!
//! ## Features
//!
//! - `set_up_suite` / `set_up_test` / `tear_down_test` / `tear_down_suite` hooks
//! - Regular-expression test selection by name, suite or `Suite.test`
//! - Non-fatal checks and fatal asserts with pluggable checkers
//! - Expected failures, skips and panic containment
//! - Text, JSON and CI service-message output
//!
//! ## Usage
//!
//! ```ignore
//! use suitecheck::{assert_that, check::Equals, CallContext, MethodSet, Registry, Suite};
//!
//! #[derive(Default)]
//! struct MathSuite {
//!     base: i32,
//! }
//!
//! impl Suite for MathSuite {
//!     fn register(methods: &mut MethodSet<Self>) {
//!         methods
//!             .set_up_test(|s: &mut Self, _: &mut CallContext| s.base = 40)
//!             .test("test_add", |s: &mut Self, c: &mut CallContext| {
//!                 assert_that!(c, s.base + 2, Equals, 42)
//!             });
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     suitecheck::cli::main(Registry::new().with(MathSuite::default()))
//! }
//! ```

pub mod check;
pub mod cli;
pub mod config;
pub mod executor;
pub mod filter;
pub mod models;
pub mod output;
pub mod suite;
pub mod utils;

pub use check::{comment, thunk, Checker, Value};
pub use config::RunConfig;
pub use executor::{list, run, run_all};
pub use models::{CallContext, Outcome, RunError, RunResult, Stop};
pub use output::{OutputFormat, OutputSink, SharedBuffer};
pub use suite::{MethodSet, Registry, Suite};
