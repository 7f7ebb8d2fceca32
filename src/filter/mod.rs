//! Test selection filter
//!
//! A filter is a regular expression searched (not anchored) in the test
//! name, the suite name and the qualified `Suite.test` name.

use regex::Regex;
use thiserror::Error;

/// Filter pattern that failed to compile
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{0}")]
pub struct FilterError(#[from] regex::Error);

/// Compiled test filter
#[derive(Clone, Debug)]
pub enum Filter {
    /// Selects every test
    All,
    Pattern(Regex),
}

impl Filter {
    /// Compile a user pattern; the empty pattern selects everything
    pub fn compile(pattern: &str) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Ok(Filter::All);
        }
        Ok(Filter::Pattern(Regex::new(pattern)?))
    }

    /// Compile an optional pattern, treating `None` as the empty pattern
    pub fn from_option(pattern: Option<&str>) -> Result<Self, FilterError> {
        Self::compile(pattern.unwrap_or(""))
    }

    /// Whether the test `suite.test` is selected
    pub fn matches(&self, suite: &str, test: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Pattern(re) => {
                re.is_match(test)
                    || re.is_match(suite)
                    || re.is_match(&format!("{suite}.{test}"))
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}
