//! Suite registry
//!
//! Holds suite instances of different types behind one object-safe trait so
//! a whole program's suites can be listed and run together.

use futures::future::BoxFuture;
use std::fmt;

use super::{classify, Suite};
use crate::config::RunConfig;
use crate::executor::run_filtered;
use crate::filter::Filter;
use crate::models::RunResult;

/// Type-erased suite instance
pub(crate) trait RegisteredSuite: Send {
    fn suite_name(&self) -> String;

    /// Qualified names of the tests `filter` selects
    fn test_names(&self, filter: &Filter) -> Vec<String>;

    fn run<'a>(self: Box<Self>, config: &'a RunConfig, filter: &'a Filter) -> BoxFuture<'a, RunResult>;
}

impl<S: Suite> RegisteredSuite for S {
    fn suite_name(&self) -> String {
        <S as Suite>::name()
    }

    fn test_names(&self, filter: &Filter) -> Vec<String> {
        classify::<S>()
            .select(filter)
            .iter()
            .map(|test| test.info().qualified_name())
            .collect()
    }

    fn run<'a>(self: Box<Self>, config: &'a RunConfig, filter: &'a Filter) -> BoxFuture<'a, RunResult> {
        Box::pin(run_filtered(*self, config, filter))
    }
}

/// Ordered collection of suites to run
#[derive(Default)]
pub struct Registry {
    suites: Vec<Box<dyn RegisteredSuite>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Registry::add`]
    pub fn with<S: Suite>(mut self, suite: S) -> Self {
        self.add(suite);
        self
    }

    /// Append a suite instance; suites run in insertion order
    pub fn add<S: Suite>(&mut self, suite: S) -> &mut Self {
        self.suites.push(Box::new(suite));
        self
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Suite names in run order
    pub fn names(&self) -> Vec<String> {
        self.suites.iter().map(|s| s.suite_name()).collect()
    }

    pub(crate) fn suites(&self) -> impl Iterator<Item = &dyn RegisteredSuite> {
        self.suites.iter().map(|s| s.as_ref())
    }

    pub(crate) fn into_suites(self) -> Vec<Box<dyn RegisteredSuite>> {
        self.suites
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("suites", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallContext;
    use crate::output::OutputSink;
    use crate::suite::MethodSet;

    struct Alpha;
    struct Beta {
        factor: i32,
    }

    impl Suite for Alpha {
        fn register(methods: &mut MethodSet<Self>) {
            methods.test("test_one", |_: &mut Self, _: &mut CallContext| {});
        }
    }

    impl Suite for Beta {
        fn register(methods: &mut MethodSet<Self>) {
            methods
                .test("test_scaled", |s: &mut Self, c: &mut CallContext| {
                    if s.factor != 2 {
                        c.error(format!("factor is {}", s.factor));
                    }
                })
                .test("test_other", |_: &mut Self, _: &mut CallContext| {});
        }

        fn name() -> String {
            "BetaSuite".to_string()
        }
    }

    #[test]
    fn test_registry_order_and_names() {
        let mut registry = Registry::new().with(Alpha);
        registry.add(Beta { factor: 2 });

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.names(), vec!["Alpha", "BetaSuite"]);
        assert_eq!(format!("{registry:?}"), r#"Registry { suites: ["Alpha", "BetaSuite"] }"#);
    }

    #[test]
    fn test_names_respect_filter() {
        let registry = Registry::new().with(Alpha).with(Beta { factor: 2 });
        let filter = Filter::compile("scaled|Alpha").unwrap();
        let names: Vec<String> = registry
            .suites()
            .flat_map(|s| s.test_names(&filter))
            .collect();
        assert_eq!(names, vec!["Alpha.test_one", "BetaSuite.test_scaled"]);
    }

    #[test]
    fn test_erased_run_uses_instance_state() {
        let config = RunConfig::new().with_output(OutputSink::null());
        let filter = Filter::All;
        let mut suites = Registry::new().with(Beta { factor: 3 }).into_suites();
        let beta = suites.remove(0);

        let result = tokio_test::block_on(beta.run(&config, &filter));
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);
    }
}
