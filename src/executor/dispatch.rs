//! Single-call dispatch
//!
//! Invokes one method body with a fresh [`CallContext`] inside the panic
//! boundary and turns whatever happened into a [`Call`].

use std::sync::Arc;
use tracing::debug;

use super::panics::run_guarded;
use crate::models::{Call, CallContext, CallKind, CallStatus, Method, MethodBody, MethodInfo};

/// Run `method` against `suite`
pub(crate) fn invoke<S>(suite: &mut S, method: &Method<S>, kind: CallKind) -> Call {
    debug!("Calling {}", method.info());

    let call = match method.body() {
        MethodBody::Misshapen { declared } => shape_error(method.info(), kind, declared),
        MethodBody::WithContext(body) => {
            let mut c = CallContext::new(method.info(), kind);
            match run_guarded(|| body(suite, &mut c)) {
                Ok(_) => {
                    let status = c.settled_status();
                    c.finish(status)
                }
                Err(report) => {
                    c.log_panic(&report);
                    c.finish(CallStatus::Panicked)
                }
            }
        }
    };

    debug!("{}", call);
    call
}

/// Panicked call for a body whose parameters the engine cannot supply
pub(crate) fn shape_error(info: &Arc<MethodInfo>, kind: CallKind, declared: &str) -> Call {
    debug!("{} declared as {}", info, declared);
    let mut c = CallContext::new(info, kind);
    c.log_arg_panic();
    c.finish(CallStatus::Panicked)
}
