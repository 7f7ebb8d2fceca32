//! Built-in checkers

use regex::Regex;
use std::any::Any;

use super::value::{Capability, Value};
use super::{Checker, CheckerInfo};
use crate::executor::panics;

fn arity_mismatch(info: &CheckerInfo, got: usize) -> (bool, String) {
    (
        false,
        format!(
            "Wrong number of parameters for {}: want {}, got {}",
            info.name,
            info.arity(),
            got
        ),
    )
}

/// Full-string regex match of `text` against `pattern`
fn full_match(text: &str, pattern: &str) -> (bool, String) {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => (re.is_match(text), String::new()),
        Err(e) => (false, format!("Can't compile regex: {e}")),
    }
}

macro_rules! unary_params {
    ($self:ident, $params:ident) => {
        match $params {
            [value] => *value,
            _ => return arity_mismatch(&$self.info(), $params.len()),
        }
    };
}

macro_rules! binary_params {
    ($self:ident, $params:ident) => {
        match $params {
            [obtained, expected] => (*obtained, *expected),
            _ => return arity_mismatch(&$self.info(), $params.len()),
        }
    };
}

/// Same type and equal; shared pointers must be the same allocation
#[derive(Clone, Copy, Debug, Default)]
pub struct Equals;

impl Checker for Equals {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("Equals", &["obtained", "expected"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, expected) = binary_params!(self, params);
        (obtained.equals(expected), String::new())
    }
}

/// Same type and structurally equal, looking through shared pointers
#[derive(Clone, Copy, Debug, Default)]
pub struct DeepEquals;

impl Checker for DeepEquals {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("DeepEquals", &["obtained", "expected"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, expected) = binary_params!(self, params);
        (obtained.deep_equals(expected), String::new())
    }
}

/// `None`, a null pointer, or anything else reporting itself as nil
#[derive(Clone, Copy, Debug, Default)]
pub struct IsNil;

impl Checker for IsNil {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("IsNil", &["value"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let value = unary_params!(self, params);
        (value.is_nil(), String::new())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NotNil;

impl Checker for NotNil {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("NotNil", &["value"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let value = unary_params!(self, params);
        (!value.is_nil(), String::new())
    }
}

/// Length of a collection or string equals the expected count
#[derive(Clone, Copy, Debug, Default)]
pub struct HasLen;

fn as_count(value: &dyn Value) -> Option<usize> {
    let any = value.as_any();
    if let Some(n) = any.downcast_ref::<usize>() {
        return Some(*n);
    }
    if let Some(n) = any.downcast_ref::<i32>() {
        return usize::try_from(*n).ok();
    }
    if let Some(n) = any.downcast_ref::<u32>() {
        return usize::try_from(*n).ok();
    }
    if let Some(n) = any.downcast_ref::<i64>() {
        return usize::try_from(*n).ok();
    }
    any.downcast_ref::<u64>()
        .and_then(|n| usize::try_from(*n).ok())
}

impl Checker for HasLen {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("HasLen", &["obtained", "n"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, expected) = binary_params!(self, params);
        let Some(n) = as_count(expected) else {
            return (false, "n must be a non-negative integer".to_string());
        };
        match obtained.length() {
            Some(len) => (len == n, String::new()),
            None => (false, "obtained value type has no length".to_string()),
        }
    }
}

/// Whole text of the value matches the regex
#[derive(Clone, Copy, Debug, Default)]
pub struct Matches;

impl Checker for Matches {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("Matches", &["value", "regex"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, expected) = binary_params!(self, params);
        let Some(pattern) = expected.as_text() else {
            return (false, "Regex must be a string".to_string());
        };
        match obtained.as_text() {
            Some(text) => full_match(&text, &pattern),
            None => (
                false,
                "Obtained value is not a string and has no text form".to_string(),
            ),
        }
    }
}

/// Whole message of an error matches the regex
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorMatches;

impl Checker for ErrorMatches {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("ErrorMatches", &["value", "regex"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, expected) = binary_params!(self, params);
        if obtained.is_nil() {
            return (false, "Error value is nil".to_string());
        }
        let Some(message) = obtained.as_error() else {
            return (false, "Value is not an error".to_string());
        };
        let Some(pattern) = expected.as_text() else {
            return (false, "Regex must be a string".to_string());
        };
        full_match(&message, &pattern)
    }
}

/// Run a thunk and capture what it panicked with
fn capture_panic(function: &dyn Value) -> Result<Box<dyn Any + Send>, (bool, String)> {
    let Some(callable) = function.as_callable() else {
        return Err((false, "Function must take no arguments".to_string()));
    };
    match panics::catch_quietly(callable) {
        Ok(()) => Err((false, "Function has not panicked".to_string())),
        Err(payload) => Ok(payload),
    }
}

/// Calling the thunk panics with a value equal to the expected one
#[derive(Clone, Copy, Debug, Default)]
pub struct Panics;

impl Checker for Panics {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("Panics", &["function", "expected"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (function, expected) = binary_params!(self, params);
        let payload = match capture_panic(function) {
            Ok(payload) => payload,
            Err(failure) => return failure,
        };
        let message = panics::payload_message(payload.as_ref());
        let ok = match (&message, expected.as_text()) {
            (Some(message), Some(text)) => *message == text,
            _ => {
                let payload: &dyn Any = payload.as_ref();
                expected.deep_eq_any(payload)
            }
        };
        if ok {
            (true, String::new())
        } else {
            let shown = message.unwrap_or_else(|| "<non-text panic value>".to_string());
            (false, format!("Panic value: {shown:?}"))
        }
    }
}

/// Calling the thunk panics with a message matching the regex
#[derive(Clone, Copy, Debug, Default)]
pub struct PanicMatches;

impl Checker for PanicMatches {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("PanicMatches", &["function", "expected"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (function, expected) = binary_params!(self, params);
        let Some(pattern) = expected.as_text() else {
            return (false, "Regex must be a string".to_string());
        };
        let payload = match capture_panic(function) {
            Ok(payload) => payload,
            Err(failure) => return failure,
        };
        let Some(message) = panics::payload_message(payload.as_ref()) else {
            return (false, "Panic value is not a string".to_string());
        };
        let (ok, diagnostic) = full_match(&message, &pattern);
        if ok || !diagnostic.is_empty() {
            (ok, diagnostic)
        } else {
            (false, format!("Panic value: {message:?}"))
        }
    }
}

/// Obtained value has the same type as the sample
#[derive(Clone, Copy, Debug, Default)]
pub struct FitsTypeOf;

impl Checker for FitsTypeOf {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("FitsTypeOf", &["obtained", "sample"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, sample) = binary_params!(self, params);
        (obtained.same_type(sample), String::new())
    }
}

/// Obtained value offers the expected [`Capability`]
#[derive(Clone, Copy, Debug, Default)]
pub struct Implements;

impl Checker for Implements {
    fn info(&self) -> CheckerInfo {
        CheckerInfo::new("Implements", &["obtained", "capability"])
    }

    fn check(&self, params: &[&dyn Value]) -> (bool, String) {
        let (obtained, expected) = binary_params!(self, params);
        match expected.as_any().downcast_ref::<Capability>() {
            Some(capability) => (capability.offered_by(obtained), String::new()),
            None => (false, "Expected value must be a Capability".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{comment, thunk, Not};
    use std::sync::Arc;

    #[test]
    fn test_equals() {
        assert_eq!(Equals.check(&[&42, &42]), (true, String::new()));
        assert_eq!(Equals.check(&[&42, &43]), (false, String::new()));
        assert_eq!(Equals.check(&[&42i32, &42i64]), (false, String::new()));
        assert_eq!(
            Equals.check(&[&"a".to_string(), &"a".to_string()]),
            (true, String::new())
        );
    }

    #[test]
    fn test_equals_arity() {
        let (ok, msg) = Equals.check(&[&1]);
        assert!(!ok);
        assert_eq!(msg, "Wrong number of parameters for Equals: want 2, got 1");
    }

    #[test]
    fn test_deep_equals_through_pointers() {
        let a = Arc::new(vec![1, 2]);
        let b = Arc::new(vec![1, 2]);
        assert!(!Equals.check(&[&a, &b]).0);
        assert!(DeepEquals.check(&[&a, &b]).0);
        assert!(!DeepEquals.check(&[&a, &Arc::new(vec![2, 1])]).0);
    }

    #[test]
    fn test_nil_checkers() {
        assert!(IsNil.check(&[&None::<String>]).0);
        assert!(!IsNil.check(&[&Some(1)]).0);
        assert!(NotNil.check(&[&Some(1)]).0);
        assert!(IsNil.check(&[&std::ptr::null_mut::<u8>()]).0);
    }

    #[test]
    fn test_has_len() {
        assert!(HasLen.check(&[&vec![1, 2, 3], &3]).0);
        assert!(!HasLen.check(&[&"ab", &3]).0);
        let (ok, msg) = HasLen.check(&[&7u8, &1]);
        assert!(!ok);
        assert!(msg.contains("no length"));
    }

    #[test]
    fn test_matches_is_anchored() {
        assert!(Matches.check(&[&"abc", &"a.c"]).0);
        assert!(!Matches.check(&[&"xabc", &"a.c"]).0);
        assert!(Matches.check(&[&"abc", &"a|abc"]).0);
        let (ok, msg) = Matches.check(&[&"abc", &"["]);
        assert!(!ok);
        assert!(msg.starts_with("Can't compile regex"));
        let (ok, msg) = Matches.check(&[&1, &"1"]);
        assert!(!ok);
        assert!(msg.contains("not a string"));
    }

    #[test]
    fn test_error_matches() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        assert!(ErrorMatches.check(&[&err, &"file .*"]).0);
        assert!(!ErrorMatches.check(&[&err, &"missing"]).0);
        let none: Option<std::io::Error> = None;
        assert_eq!(ErrorMatches.check(&[&none, &".*"]).1, "Error value is nil");
        assert_eq!(ErrorMatches.check(&[&5, &".*"]).1, "Value is not an error");
    }

    #[test]
    fn test_panics() {
        assert!(Panics.check(&[&thunk(|| panic!("boom")), &"boom"]).0);
        let (ok, msg) = Panics.check(&[&thunk(|| panic!("boom")), &"bang"]);
        assert!(!ok);
        assert_eq!(msg, "Panic value: \"boom\"");
        let (ok, msg) = Panics.check(&[&thunk(|| {}), &"boom"]);
        assert!(!ok);
        assert_eq!(msg, "Function has not panicked");
        assert!(Panics
            .check(&[&thunk(|| std::panic::panic_any(17u32)), &17u32])
            .0);
    }

    #[test]
    fn test_panic_matches() {
        let code = 7;
        assert!(
            PanicMatches
                .check(&[&thunk(move || panic!("exit code {code}")), &"exit code \\d+"])
                .0
        );
        assert!(!PanicMatches.check(&[&thunk(|| panic!("oops")), &"boom"]).0);
        let (ok, msg) = PanicMatches.check(&[&42, &".*"]);
        assert!(!ok);
        assert_eq!(msg, "Function must take no arguments");
    }

    #[test]
    fn test_type_checkers() {
        assert!(FitsTypeOf.check(&[&1u8, &0u8]).0);
        assert!(!FitsTypeOf.check(&[&1u8, &0u16]).0);
        assert!(Implements.check(&[&"text", &Capability::Text]).0);
        assert!(!Implements.check(&[&1, &Capability::Error]).0);
        assert!(Not(Implements).check(&[&1, &Capability::Error]).0);
        assert!(!Implements.check(&[&1, &comment("x")]).0);
    }
}
