//! Core traits for the dispatch abstraction.
//!
//! This module defines the seam between the binder and a concrete automation
//! mechanism:
//!
//! - [`Resolver`]: Finds a class by identifier in the current environment.
//! - [`ClassDescriptor`]: A resolved class that can construct instances.
//! - [`NativeObject`]: A constructed instance that accepts late-bound calls.

use std::fmt::Debug;

use crate::error::Result;
use crate::value::{Arg, ClassId, InvokeKind, Value};

/// Factory that resolves class identifiers to constructible descriptors.
///
/// # Platform Behavior
///
/// - **Windows**: ProgID lookup in the COM registry.
/// - **Elsewhere**: Only in-memory registrations are resolvable.
pub trait Resolver: Send + Sync {
    /// Resolve a class identifier.
    ///
    /// Returns [`DispatchError::ClassNotRegistered`](crate::DispatchError::ClassNotRegistered)
    /// when the class is unknown in this environment.
    fn resolve(&self, class: &ClassId) -> Result<Box<dyn ClassDescriptor>>;

    /// Get the adapter name (for logging).
    fn name(&self) -> &'static str;
}

/// A class that has been resolved and can be instantiated.
pub trait ClassDescriptor: Send + Sync + Debug {
    /// The identifier this descriptor was resolved from.
    fn class_id(&self) -> &ClassId;

    /// Construct a new instance of the class.
    fn construct(&self) -> Result<Box<dyn NativeObject>>;
}

/// A constructed native object accepting calls by member name.
///
/// Dropping the object releases the underlying native instance.
pub trait NativeObject: Send {
    /// Invoke a member.
    ///
    /// Arguments are in declaration order. [`Arg::Out`] slots are overwritten
    /// with the values the native side wrote back.
    fn invoke(&mut self, member: &str, kind: InvokeKind, args: &mut [Arg]) -> Result<Value>;
}
