//! Values exchanged with native automation objects.
//!
//! Arguments are positional. An omitted optional argument is passed as
//! [`Arg::Absent`], which the adapters marshal as their "no value" marker so
//! that the native side can tell "unspecified" apart from `0` or `""`.

use std::fmt;

/// Identifier of a native automation class (a ProgID on Windows).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(String);

impl ClassId {
    /// Create a class identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClassId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for ClassId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

/// How a member is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// Call a method.
    Method,
    /// Read a (possibly indexed) property.
    PropertyGet,
    /// Write a (possibly indexed) property. The last argument is the new value.
    PropertyPut,
}

impl InvokeKind {
    /// Get a short name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::PropertyGet => "get",
            Self::PropertyPut => "put",
        }
    }
}

/// A single positional argument passed to a native member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// The caller did not supply this optional argument.
    Absent,
    /// A string argument.
    Str(String),
    /// An unsigned 32-bit argument.
    U32(u32),
    /// A signed 32-bit argument.
    I32(i32),
    /// A by-reference output slot. The native side overwrites the value.
    Out(Value),
}

impl Arg {
    /// Create an output slot initialized to [`Value::Empty`].
    #[must_use]
    pub const fn out() -> Self {
        Self::Out(Value::Empty)
    }

    /// Check if this is the absent marker.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Get the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value written into an output slot.
    #[must_use]
    pub const fn out_value(&self) -> Option<&Value> {
        match self {
            Self::Out(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Self::U32(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Self::I32(n)
    }
}

impl<T: Into<Self>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// A value returned by a native member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// No value.
    #[default]
    Empty,
    /// A string.
    Str(String),
    /// An unsigned 32-bit integer.
    U32(u32),
    /// A signed 32-bit integer.
    I32(i32),
    /// A boolean.
    Bool(bool),
    /// An array of values.
    List(Vec<Value>),
}

impl Value {
    /// Get the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get a non-negative integer payload as `u32`.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::U32(n) => Some(n),
            Self::I32(n) => u32::try_from(n).ok(),
            _ => None,
        }
    }

    /// Consume the value and return the list payload, if any.
    #[must_use]
    pub fn into_list(self) -> Option<Vec<Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consume the value and return the string payload, if any.
    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is [`Value::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::U32(n)
    }
}
