//! Suite method models
//!
//! Defines method roles, registration metadata and the callable bodies the
//! engine dispatches.

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::models::CallContext;

/// Prefix a method name must carry to be scheduled as a test
pub const TEST_PREFIX: &str = "test";

/// Role a suite method plays in the run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SetUpSuite,
    TearDownSuite,
    SetUpTest,
    TearDownTest,
    Test,
}

impl Role {
    /// Classify a method by its registered name
    ///
    /// Lifecycle hooks match exactly; anything else must carry the test
    /// prefix. Other names yield `None` and are ignored by the engine.
    pub fn classify(name: &str) -> Option<Role> {
        match name {
            "set_up_suite" => Some(Role::SetUpSuite),
            "tear_down_suite" => Some(Role::TearDownSuite),
            "set_up_test" => Some(Role::SetUpTest),
            "tear_down_test" => Some(Role::TearDownTest),
            _ if name.starts_with(TEST_PREFIX) => Some(Role::Test),
            _ => None,
        }
    }

    /// Canonical method name of a lifecycle hook
    pub fn hook_name(&self) -> Option<&'static str> {
        match self {
            Role::SetUpSuite => Some("set_up_suite"),
            Role::TearDownSuite => Some("tear_down_suite"),
            Role::SetUpTest => Some("set_up_test"),
            Role::TearDownTest => Some("tear_down_test"),
            Role::Test => None,
        }
    }

    pub fn is_fixture(&self) -> bool {
        !matches!(self, Role::Test)
    }
}

/// Source location of a method registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    pub fn from_caller(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Immutable metadata of a classified method
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub suite: String,
    pub name: String,
    pub role: Role,
    pub location: SourceLocation,
}

impl MethodInfo {
    /// "Suite.method"
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.suite, self.name)
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.suite, self.name)
    }
}

/// Early-exit marker returned by fatal helpers on [`CallContext`]
///
/// Bodies returning `Result<(), Stop>` propagate it with `?`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stop;

/// What a method body hands back to the engine
pub type Outcome = Result<(), Stop>;

/// Return types accepted from method bodies
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Ok(())
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

type BodyFn<S> = dyn Fn(&mut S, &mut CallContext) -> Outcome + Send + Sync;

/// Callable behind a registered method
pub enum MethodBody<S> {
    /// Takes the per-call context, the only shape the engine invokes
    WithContext(Arc<BodyFn<S>>),
    /// Registered with a parameter list the engine cannot satisfy
    Misshapen { declared: &'static str },
}

impl<S> Clone for MethodBody<S> {
    fn clone(&self) -> Self {
        match self {
            MethodBody::WithContext(body) => MethodBody::WithContext(Arc::clone(body)),
            MethodBody::Misshapen { declared } => MethodBody::Misshapen { declared },
        }
    }
}

/// Marker for bodies shaped `Fn(&mut S, &mut CallContext) -> R`
pub struct WithContext<R>(std::marker::PhantomData<fn() -> R>);

/// Marker for bodies shaped `Fn(&mut S) -> R`
pub struct WithoutContext<R>(std::marker::PhantomData<fn() -> R>);

/// Conversion from a plain function or closure into a [`MethodBody`]
///
/// The `Marker` parameter only disambiguates the blanket implementations.
pub trait IntoMethod<S, Marker> {
    fn into_body(self) -> MethodBody<S>;
}

impl<S, F, R> IntoMethod<S, WithContext<R>> for F
where
    S: 'static,
    F: Fn(&mut S, &mut CallContext) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_body(self) -> MethodBody<S> {
        MethodBody::WithContext(Arc::new(move |suite: &mut S, c: &mut CallContext| {
            self(suite, c).into_outcome()
        }))
    }
}

impl<S, F, R> IntoMethod<S, WithoutContext<R>> for F
where
    S: 'static,
    F: Fn(&mut S) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_body(self) -> MethodBody<S> {
        MethodBody::Misshapen {
            declared: "fn(&mut Self)",
        }
    }
}

/// A classified method bound to suite type `S`
pub struct Method<S> {
    info: Arc<MethodInfo>,
    identity: TypeId,
    body: MethodBody<S>,
}

impl<S> Method<S> {
    pub fn new(info: MethodInfo, identity: TypeId, body: MethodBody<S>) -> Self {
        Self {
            info: Arc::new(info),
            identity,
            body,
        }
    }

    pub fn info(&self) -> &Arc<MethodInfo> {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn role(&self) -> Role {
        self.info.role
    }

    /// Identity of the underlying callable, used for deduplication
    pub fn identity(&self) -> TypeId {
        self.identity
    }

    pub fn body(&self) -> &MethodBody<S> {
        &self.body
    }

    /// Whether the engine can invoke this method with a [`CallContext`]
    pub fn is_well_shaped(&self) -> bool {
        matches!(self.body, MethodBody::WithContext(_))
    }
}

impl<S> Clone for Method<S> {
    fn clone(&self) -> Self {
        Self {
            info: Arc::clone(&self.info),
            identity: self.identity,
            body: self.body.clone(),
        }
    }
}

impl<S> fmt::Debug for Method<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("info", &self.info)
            .field("well_shaped", &self.is_well_shaped())
            .finish()
    }
}
