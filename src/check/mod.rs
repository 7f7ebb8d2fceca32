//! Checker protocol
//!
//! A [`Checker`] decides whether an obtained value satisfies some condition,
//! optionally against an expected value. Checkers are consumed by
//! [`CallContext::check`](crate::CallContext::check) and
//! [`CallContext::assert`](crate::CallContext::assert), which handle argument
//! arity, trailing comments and failure logging.

mod builtin;
mod value;

pub use builtin::{
    DeepEquals, Equals, ErrorMatches, FitsTypeOf, HasLen, Implements, IsNil, Matches, NotNil,
    PanicMatches, Panics,
};
pub use value::{comment, thunk, Capability, Comment, Thunk, Value};

/// Display metadata of a checker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckerInfo {
    pub name: String,
    /// Labels of the parameters, obtained value first
    pub params: Vec<&'static str>,
}

impl CheckerInfo {
    pub fn new(name: impl Into<String>, params: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            params: params.to_vec(),
        }
    }

    /// Number of parameters, including the obtained value
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether an expected value must follow the obtained one
    pub fn needs_expected(&self) -> bool {
        self.params.len() > 1
    }
}

/// A pluggable predicate with a diagnostic
pub trait Checker: Send + Sync {
    fn info(&self) -> CheckerInfo;

    /// Evaluate `params` (obtained value first)
    ///
    /// Returns the verdict and an optional diagnostic; the empty string means
    /// no diagnostic.
    fn check(&self, params: &[&dyn Value]) -> (bool, String);

    /// Evaluate the inverted condition
    ///
    /// An arity mismatch is not a verdict and passes through uninverted.
    fn check_negated(&self, params: &[&dyn Value]) -> (bool, String) {
        if params.len() != self.info().arity() {
            return self.check(params);
        }
        let (ok, _) = self.check(params);
        (!ok, String::new())
    }
}

impl<C: Checker + ?Sized> Checker for &C {
    fn info(&self) -> CheckerInfo {
        (**self).info()
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        (**self).check(params)
    }

    fn check_negated(&self, params: &[&dyn Value]) -> (bool, String) {
        (**self).check_negated(params)
    }
}

impl<C: Checker + ?Sized> Checker for Box<C> {
    fn info(&self) -> CheckerInfo {
        (**self).info()
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        (**self).check(params)
    }

    fn check_negated(&self, params: &[&dyn Value]) -> (bool, String) {
        (**self).check_negated(params)
    }
}

/// Inverts another checker
///
/// `Not(Not(x))` evaluates exactly like `x`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Not<C>(pub C);

impl<C: Checker> Checker for Not<C> {
    fn info(&self) -> CheckerInfo {
        let inner = self.0.info();
        CheckerInfo {
            name: format!("Not({})", inner.name),
            params: inner.params,
        }
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        self.0.check_negated(params)
    }

    fn check_negated(&self, params: &[&dyn Value]) -> (bool, String) {
        self.0.check(params)
    }
}
