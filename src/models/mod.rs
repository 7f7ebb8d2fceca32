//! Data models for suite execution
//!
//! Methods, calls, the per-call context and aggregated results.

mod call;
mod context;
mod method;
mod result;

pub use call::{Call, CallKind, CallStatus};
pub use context::CallContext;
pub use method::{
    IntoMethod, IntoOutcome, Method, MethodBody, MethodInfo, Outcome, Role, SourceLocation, Stop,
    WithContext, WithoutContext, TEST_PREFIX,
};
pub use result::{RunError, RunResult};
