//! Method classification
//!
//! Turns a suite's registrations into lifecycle hooks and an ordered test
//! list, dropping duplicate registrations of the same callable.

use std::any::TypeId;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::{MethodSet, Registration, Suite};
use crate::filter::Filter;
use crate::models::{Method, MethodInfo, Role};

/// Classified methods of one suite type
pub struct MethodTable<S> {
    pub suite: String,
    pub set_up_suite: Option<Method<S>>,
    pub tear_down_suite: Option<Method<S>>,
    pub set_up_test: Option<Method<S>>,
    pub tear_down_test: Option<Method<S>>,
    /// Tests in declaration order
    pub tests: Vec<Method<S>>,
}

impl<S> MethodTable<S> {
    fn empty(suite: String) -> Self {
        Self {
            suite,
            set_up_suite: None,
            tear_down_suite: None,
            set_up_test: None,
            tear_down_test: None,
            tests: Vec::new(),
        }
    }

    fn hook_slot(&mut self, role: Role) -> Option<&mut Option<Method<S>>> {
        match role {
            Role::SetUpSuite => Some(&mut self.set_up_suite),
            Role::TearDownSuite => Some(&mut self.tear_down_suite),
            Role::SetUpTest => Some(&mut self.set_up_test),
            Role::TearDownTest => Some(&mut self.tear_down_test),
            Role::Test => None,
        }
    }

    /// The hook registered for `role`, if any
    pub fn hook(&self, role: Role) -> Option<&Method<S>> {
        match role {
            Role::SetUpSuite => self.set_up_suite.as_ref(),
            Role::TearDownSuite => self.tear_down_suite.as_ref(),
            Role::SetUpTest => self.set_up_test.as_ref(),
            Role::TearDownTest => self.tear_down_test.as_ref(),
            Role::Test => None,
        }
    }

    /// Present lifecycle hooks, in execution order
    pub fn hooks(&self) -> impl Iterator<Item = &Method<S>> {
        [
            &self.set_up_suite,
            &self.set_up_test,
            &self.tear_down_test,
            &self.tear_down_suite,
        ]
        .into_iter()
        .flatten()
    }

    /// Tests accepted by `filter`, in declaration order
    pub fn select(&self, filter: &Filter) -> Vec<Method<S>> {
        self.tests
            .iter()
            .filter(|test| filter.matches(&self.suite, test.name()))
            .cloned()
            .collect()
    }
}

/// Classify the registrations of suite type `S`
pub fn classify<S: Suite>() -> MethodTable<S> {
    let mut set = MethodSet::new();
    S::register(&mut set);
    classify_entries(S::name(), set.into_entries())
}

pub(crate) fn classify_entries<S>(suite: String, entries: Vec<Registration<S>>) -> MethodTable<S> {
    let mut table = MethodTable::empty(suite);
    let mut seen: HashSet<(TypeId, String)> = HashSet::new();

    for entry in entries {
        let Some(role) = Role::classify(&entry.name) else {
            debug!("{}.{} is not a test or fixture, ignoring", table.suite, entry.name);
            continue;
        };

        if !seen.insert((entry.identity, entry.name.clone())) {
            debug!("{}.{} registered twice, keeping the first", table.suite, entry.name);
            continue;
        }

        let info = MethodInfo {
            suite: table.suite.clone(),
            name: entry.name,
            role,
            location: entry.location,
        };

        if role == Role::Test {
            if let Some(existing) = table.tests.iter().find(|t| t.name() == info.name) {
                warn!(
                    "{} has a second {} (at {}), keeping the one at {}",
                    info.suite, info.name, info.location, existing.info().location
                );
                continue;
            }
            table
                .tests
                .push(Method::new(info, entry.identity, entry.body));
        } else if let Some(slot) = table.hook_slot(role) {
            match slot {
                Some(existing) => warn!(
                    "{} has a second {} (at {}), keeping the one at {}",
                    info.suite, info.name, info.location, existing.info().location
                ),
                None => *slot = Some(Method::new(info, entry.identity, entry.body)),
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallContext;

    struct Counter {
        hits: u32,
    }

    fn bump(s: &mut Counter, _c: &mut CallContext) {
        s.hits += 1;
    }

    fn other_set_up(_s: &mut Counter, _c: &mut CallContext) {}

    /// Shared component registration, as a helper two paths might invoke
    fn register_component(methods: &mut MethodSet<Counter>) {
        methods.set_up_test(bump).test("test_component", bump);
    }

    impl Suite for Counter {
        fn register(methods: &mut MethodSet<Self>) {
            register_component(methods);
            register_component(methods);
            methods
                .set_up_test(other_set_up)
                .test("test_first", |_: &mut Self, _: &mut CallContext| {})
                .method("helper", |_: &mut Self, _: &mut CallContext| {})
                .test("test_second", |_: &mut Self, _: &mut CallContext| {})
                .tear_down_suite(|_: &mut Self, _: &mut CallContext| {});
        }
    }

    #[test]
    fn test_classification_and_order() {
        let table = classify::<Counter>();
        assert_eq!(table.suite, "Counter");
        let names: Vec<_> = table.tests.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["test_component", "test_first", "test_second"]);
        assert!(table.set_up_suite.is_none());
        assert!(table.tear_down_suite.is_some());
        assert!(table.tear_down_test.is_none());
    }

    #[test]
    fn test_duplicate_registration_kept_once() {
        let table = classify::<Counter>();
        assert_eq!(
            table
                .tests
                .iter()
                .filter(|t| t.name() == "test_component")
                .count(),
            1
        );
    }

    #[test]
    fn test_first_hook_wins() {
        let table = classify::<Counter>();
        let set_up = table.set_up_test.as_ref().unwrap();
        let first = &table.tests[0];
        // set_up_test and test_component share the `bump` body
        assert_eq!(set_up.identity(), first.identity());
        assert_eq!(set_up.info().role, Role::SetUpTest);
    }

    #[test]
    fn test_select_with_filter() {
        let table = classify::<Counter>();
        assert_eq!(table.select(&Filter::All).len(), 3);

        let filter = Filter::compile("second").unwrap();
        let selected = table.select(&filter);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].info().qualified_name(), "Counter.test_second");

        let filter = Filter::compile("Counter").unwrap();
        assert_eq!(table.select(&filter).len(), 3);
    }

    #[test]
    fn test_hooks_iteration_order() {
        let table = classify::<Counter>();
        let roles: Vec<_> = table.hooks().map(|h| h.role()).collect();
        assert_eq!(roles, vec![Role::SetUpTest, Role::TearDownSuite]);
    }
}
