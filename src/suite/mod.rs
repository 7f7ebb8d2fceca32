//! Suite registration
//!
//! A suite is a value whose type lists its methods once, through
//! [`Suite::register`]. Registration records names, bodies and source
//! locations; classification into lifecycle hooks and tests happens later in
//! [`classify`].
//!
//! ```ignore
//! struct Math { base: i32 }
//!
//! impl Suite for Math {
//!     fn register(methods: &mut MethodSet<Self>) {
//!         methods
//!             .set_up_test(|s: &mut Self, _c: &mut CallContext| s.base = 1)
//!             .test("test_add", |s: &mut Self, c: &mut CallContext| {
//!                 assert_that!(c, s.base + 1, Equals, 2)
//!             });
//!     }
//! }
//! ```

mod classify;
mod registry;

use std::any::TypeId;
use std::panic::Location;

use crate::models::{IntoMethod, MethodBody, Role, SourceLocation};

pub use classify::{classify, MethodTable};
pub use registry::Registry;
pub(crate) use registry::RegisteredSuite;

/// A type whose methods the engine can run
pub trait Suite: Send + Sized + 'static {
    /// List the suite's methods
    fn register(methods: &mut MethodSet<Self>);

    /// Name used in reports and filters; defaults to the bare type name
    fn name() -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }
}

/// Strip the module path (and generic arguments) from a type name
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// One raw registration, before classification
pub(crate) struct Registration<S> {
    pub(crate) name: String,
    pub(crate) identity: TypeId,
    pub(crate) body: MethodBody<S>,
    pub(crate) location: SourceLocation,
}

/// Registration builder handed to [`Suite::register`]
pub struct MethodSet<S> {
    entries: Vec<Registration<S>>,
}

impl<S: 'static> MethodSet<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a method under an arbitrary name
    ///
    /// Names matching a lifecycle hook or carrying the `test` prefix are
    /// scheduled; anything else is ignored at classification time.
    #[track_caller]
    pub fn method<F, M>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        self.entries.push(Registration {
            name: name.into(),
            identity: TypeId::of::<F>(),
            body: body.into_body(),
            location: SourceLocation::from_caller(Location::caller()),
        });
        self
    }

    #[track_caller]
    fn hook<F, M>(&mut self, role: Role, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        let name = role.hook_name().unwrap_or_default();
        self.method(name, body)
    }

    #[track_caller]
    pub fn set_up_suite<F, M>(&mut self, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        self.hook(Role::SetUpSuite, body)
    }

    #[track_caller]
    pub fn tear_down_suite<F, M>(&mut self, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        self.hook(Role::TearDownSuite, body)
    }

    #[track_caller]
    pub fn set_up_test<F, M>(&mut self, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        self.hook(Role::SetUpTest, body)
    }

    #[track_caller]
    pub fn tear_down_test<F, M>(&mut self, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        self.hook(Role::TearDownTest, body)
    }

    /// Register a test; the name should carry the `test` prefix
    #[track_caller]
    pub fn test<F, M>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: IntoMethod<S, M> + 'static,
    {
        self.method(name, body)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<Registration<S>> {
        self.entries
    }
}
