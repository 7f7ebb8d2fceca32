//! Dynamic values seen by checkers
//!
//! Checkers receive their parameters as `&dyn Value`. The trait exposes the
//! handful of capabilities the built-in checkers probe: equality, nil-ness,
//! a textual or error rendering, a zero-argument callable, and a length.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::{mpsc, Arc};

/// A value that can be handed to a [`Checker`](super::Checker)
pub trait Value: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Equality against a value of the same concrete type
    ///
    /// Values of different types are never equal. Shared pointers compare by
    /// identity.
    fn eq_any(&self, other: &dyn Any) -> bool;

    /// Structural equality, looking through shared pointers
    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        self.eq_any(other)
    }

    fn is_nil(&self) -> bool {
        false
    }

    fn as_text(&self) -> Option<String> {
        None
    }

    fn as_error(&self) -> Option<String> {
        None
    }

    fn as_callable(&self) -> Option<&dyn Fn()> {
        None
    }

    /// Annotation text when this value is a [`Comment`] rather than data
    fn as_comment(&self) -> Option<&str> {
        None
    }

    fn length(&self) -> Option<usize> {
        None
    }
}

impl dyn Value {
    pub fn same_type(&self, other: &dyn Value) -> bool {
        self.as_any().type_id() == other.as_any().type_id()
    }

    pub fn equals(&self, other: &dyn Value) -> bool {
        self.eq_any(other.as_any())
    }

    pub fn deep_equals(&self, other: &dyn Value) -> bool {
        self.deep_eq_any(other.as_any())
    }
}

/// Implement [`Value`] for types with `Debug + PartialEq`
///
/// ```ignore
/// impl_value!(Point, Rect);
/// impl_value!(display Version);
/// impl_value!(error ParseError);
/// ```
#[macro_export]
macro_rules! impl_value {
    (@common) => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn eq_any(&self, other: &dyn ::std::any::Any) -> bool {
            other.downcast_ref::<Self>().map_or(false, |other| self == other)
        }
    };
    (display $($ty:ty),+ $(,)?) => {
        $(impl $crate::check::Value for $ty {
            $crate::impl_value!(@common);

            fn as_text(&self) -> Option<String> {
                Some(self.to_string())
            }
        })+
    };
    (error $($ty:ty),+ $(,)?) => {
        $(impl $crate::check::Value for $ty {
            $crate::impl_value!(@common);

            fn as_text(&self) -> Option<String> {
                Some(self.to_string())
            }

            fn as_error(&self) -> Option<String> {
                Some(self.to_string())
            }
        })+
    };
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::check::Value for $ty {
            $crate::impl_value!(@common);
        })+
    };
}

impl_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, ()
);

macro_rules! text_value {
    ($($ty:ty),+) => {
        $(impl Value for $ty {
            impl_value!(@common);

            fn as_text(&self) -> Option<String> {
                Some(self.to_string())
            }

            fn length(&self) -> Option<usize> {
                Some(self.len())
            }
        })+
    };
}

text_value!(String, &'static str);

impl<T: Value> Value for Option<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        match (self, other.downcast_ref::<Self>()) {
            (None, Some(None)) => true,
            (Some(a), Some(Some(b))) => a.eq_any(b),
            _ => false,
        }
    }

    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        match (self, other.downcast_ref::<Self>()) {
            (None, Some(None)) => true,
            (Some(a), Some(Some(b))) => a.deep_eq_any(b),
            _ => false,
        }
    }

    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn as_text(&self) -> Option<String> {
        self.as_ref().and_then(Value::as_text)
    }

    fn as_error(&self) -> Option<String> {
        self.as_ref().and_then(Value::as_error)
    }

    fn as_callable(&self) -> Option<&dyn Fn()> {
        self.as_ref().and_then(Value::as_callable)
    }

    fn length(&self) -> Option<usize> {
        self.as_ref().and_then(Value::length)
    }
}

impl<T: Value> Value for Vec<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Self>().map_or(false, |other| {
            self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.eq_any(b))
        })
    }

    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Self>().map_or(false, |other| {
            self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.deep_eq_any(b))
        })
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<K, V> Value for HashMap<K, V>
where
    K: Eq + Hash + fmt::Debug + 'static,
    V: PartialEq + fmt::Debug + 'static,
{
    impl_value!(@common);

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<K, V> Value for BTreeMap<K, V>
where
    K: Ord + fmt::Debug + 'static,
    V: PartialEq + fmt::Debug + 'static,
{
    impl_value!(@common);

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: Value> Value for Box<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| (**self).eq_any(&**other))
    }

    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| (**self).deep_eq_any(&**other))
    }

    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }

    fn as_text(&self) -> Option<String> {
        (**self).as_text()
    }

    fn as_error(&self) -> Option<String> {
        (**self).as_error()
    }

    fn as_callable(&self) -> Option<&dyn Fn()> {
        (**self).as_callable()
    }

    fn length(&self) -> Option<usize> {
        (**self).length()
    }
}

macro_rules! shared_pointer_value {
    ($($ptr:ident),+) => {
        $(impl<T: Value> Value for $ptr<T> {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn eq_any(&self, other: &dyn Any) -> bool {
                other
                    .downcast_ref::<Self>()
                    .map_or(false, |other| $ptr::ptr_eq(self, other))
            }

            fn deep_eq_any(&self, other: &dyn Any) -> bool {
                other
                    .downcast_ref::<Self>()
                    .map_or(false, |other| (**self).deep_eq_any(&**other))
            }

            fn as_text(&self) -> Option<String> {
                (**self).as_text()
            }

            fn as_error(&self) -> Option<String> {
                (**self).as_error()
            }

            fn length(&self) -> Option<usize> {
                (**self).length()
            }
        })+
    };
}

shared_pointer_value!(Arc, Rc);

macro_rules! raw_pointer_value {
    ($($ptr:ty),+) => {
        $(impl<T: 'static> Value for $ptr {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn eq_any(&self, other: &dyn Any) -> bool {
                other.downcast_ref::<Self>().map_or(false, |other| self == other)
            }

            fn is_nil(&self) -> bool {
                self.is_null()
            }
        })+
    };
}

raw_pointer_value!(*const T, *mut T);

macro_rules! channel_value {
    ($($chan:ty),+) => {
        $(impl<T: 'static> Value for $chan {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn eq_any(&self, other: &dyn Any) -> bool {
                other
                    .downcast_ref::<Self>()
                    .map_or(false, |other| std::ptr::eq(self, other))
            }
        })+
    };
}

channel_value!(mpsc::Sender<T>, mpsc::SyncSender<T>, mpsc::Receiver<T>);

impl Value for std::io::Error {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| std::ptr::eq(self, other))
    }

    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Self>().map_or(false, |other| {
            self.kind() == other.kind() && self.to_string() == other.to_string()
        })
    }

    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn as_error(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Value for Box<dyn std::error::Error + Send + Sync> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| std::ptr::eq(&**self, &**other))
    }

    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| self.to_string() == other.to_string())
    }

    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn as_error(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Value for anyhow::Error {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| std::ptr::eq(self, other))
    }

    fn deep_eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| format!("{self:#}") == format!("{other:#}"))
    }

    fn as_text(&self) -> Option<String> {
        Some(format!("{self:#}"))
    }

    fn as_error(&self) -> Option<String> {
        Some(format!("{self:#}"))
    }
}

/// A zero-argument callable, checked by `Panics` and `PanicMatches`
pub struct Thunk(Box<dyn Fn()>);

impl Thunk {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Box::new(f))
    }
}

/// Shorthand for [`Thunk::new`]
pub fn thunk(f: impl Fn() + 'static) -> Thunk {
    Thunk::new(f)
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(<fn>)")
    }
}

impl Value for Thunk {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .map_or(false, |other| std::ptr::eq(self, other))
    }

    fn as_callable(&self) -> Option<&dyn Fn()> {
        Some(&*self.0)
    }
}

/// Annotation attached as the last argument of a check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment(String);

/// Build a [`Comment`] from anything displayable
pub fn comment(text: impl fmt::Display) -> Comment {
    Comment(text.to_string())
}

impl Value for Comment {
    impl_value!(@common);

    fn as_comment(&self) -> Option<&str> {
        Some(&self.0)
    }
}

/// Capability probed by the `Implements` checker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Renders itself as text
    Text,
    /// Carries an error message
    Error,
    /// Can be called with no arguments
    Callable,
    /// Has a length
    Collection,
}

impl Capability {
    pub fn offered_by(&self, value: &dyn Value) -> bool {
        match self {
            Capability::Text => value.as_text().is_some(),
            Capability::Error => value.as_error().is_some(),
            Capability::Callable => value.as_callable().is_some(),
            Capability::Collection => value.length().is_some(),
        }
    }
}

impl Value for Capability {
    impl_value!(@common);
}
