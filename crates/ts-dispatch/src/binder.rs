//! Lazy, memoized binding of a class identifier to a native instance.
//!
//! A [`NativeObjectBinder`] is cheap to create and never fails: nothing is
//! resolved until the first operation. The first bind attempt resolves the
//! class, constructs one instance and caches both. If either step fails the
//! binder caches the failure reason and reports "not available" from then on.
//!
//! ```text
//!            bind() ok
//! Unbound ───────────────▶ Bound
//!    │                       │
//!    │ bind() failed         │ release()
//!    ▼                       ▼
//! Unavailable ──release()──▶ Unbound
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{DispatchError, Result};
use crate::traits::{ClassDescriptor, NativeObject, Resolver};
use crate::value::{Arg, ClassId, InvokeKind, Value};

/// Observable state of a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No bind attempt has been made yet.
    Unbound,
    /// The native object is constructed and cached.
    Bound,
    /// The bind attempt failed; the failure is cached.
    Unavailable,
}

/// A resolved descriptor together with the instance it constructed.
///
/// Both parts are created in one step, so a handle is never partially bound.
/// Dropping the handle releases the native instance.
pub struct NativeHandle {
    class: ClassId,
    descriptor: Box<dyn ClassDescriptor>,
    instance: Mutex<Box<dyn NativeObject>>,
}

impl NativeHandle {
    fn open(class: &ClassId, resolver: &dyn Resolver) -> Result<Self> {
        let descriptor = resolver.resolve(class)?;
        let instance = descriptor.construct()?;
        Ok(Self {
            class: class.clone(),
            descriptor,
            instance: Mutex::new(instance),
        })
    }

    /// The class identifier this handle is bound to.
    #[must_use]
    pub const fn class_id(&self) -> &ClassId {
        &self.class
    }

    /// The descriptor the instance was constructed from.
    #[must_use]
    pub fn descriptor(&self) -> &dyn ClassDescriptor {
        self.descriptor.as_ref()
    }

    /// Invoke a member on the bound instance.
    ///
    /// Calls on one handle are serialized.
    pub fn invoke(&self, member: &str, kind: InvokeKind, args: &mut [Arg]) -> Result<Value> {
        tracing::trace!(
            class = %self.class,
            member,
            kind = kind.name(),
            argc = args.len(),
            "invoking native member"
        );
        let mut instance = self
            .instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        instance.invoke(member, kind, args)
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("class", &self.class)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        tracing::debug!(class = %self.class, "releasing native object");
    }
}

#[derive(Debug)]
enum BindState {
    Bound(NativeHandle),
    Unavailable(String),
}

/// Lazily binds one class identifier to one native instance.
///
/// The binder owns its handle exclusively. The first bind runs at most once
/// even when several threads race on first use.
pub struct NativeObjectBinder {
    class: ClassId,
    resolver: Arc<dyn Resolver>,
    state: OnceLock<BindState>,
}

impl NativeObjectBinder {
    /// Create an unbound binder. The resolver is not consulted until first use.
    pub fn new(class: impl Into<ClassId>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            class: class.into(),
            resolver,
            state: OnceLock::new(),
        }
    }

    /// The class identifier this binder resolves.
    #[must_use]
    pub const fn class_id(&self) -> &ClassId {
        &self.class
    }

    /// Get the current state without triggering a bind.
    #[must_use]
    pub fn state(&self) -> BindingState {
        match self.state.get() {
            None => BindingState::Unbound,
            Some(BindState::Bound(_)) => BindingState::Bound,
            Some(BindState::Unavailable(_)) => BindingState::Unavailable,
        }
    }

    /// Bind if needed and report whether the native object is usable.
    ///
    /// Never fails. After the first attempt this is a cache read.
    pub fn is_available(&self) -> bool {
        matches!(self.bind(), BindState::Bound(_))
    }

    /// Bind if needed and return the handle.
    ///
    /// Fails with [`DispatchError::NotAvailable`] carrying the cached reason.
    pub fn handle(&self) -> Result<&NativeHandle> {
        match self.bind() {
            BindState::Bound(handle) => Ok(handle),
            BindState::Unavailable(reason) => {
                Err(DispatchError::not_available(self.class.as_str(), reason.as_str()))
            }
        }
    }

    /// Bind if needed and invoke a member on the native object.
    pub fn invoke(&self, member: &str, kind: InvokeKind, args: &mut [Arg]) -> Result<Value> {
        self.handle()?.invoke(member, kind, args)
    }

    /// Release the native object and return to [`BindingState::Unbound`].
    ///
    /// A cached failure is discarded as well, so the next operation performs
    /// a fresh bind attempt. Returns `true` if an instance was released.
    pub fn release(&mut self) -> bool {
        matches!(self.state.take(), Some(BindState::Bound(_)))
    }

    fn bind(&self) -> &BindState {
        self.state.get_or_init(|| {
            match NativeHandle::open(&self.class, self.resolver.as_ref()) {
                Ok(handle) => {
                    tracing::debug!(
                        class = %self.class,
                        resolver = self.resolver.name(),
                        "bound native object"
                    );
                    BindState::Bound(handle)
                }
                Err(err) => {
                    tracing::warn!(
                        class = %self.class,
                        resolver = self.resolver.name(),
                        error = %err,
                        "native object not available"
                    );
                    BindState::Unavailable(err.to_string())
                }
            }
        })
    }
}

impl fmt::Debug for NativeObjectBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObjectBinder")
            .field("class", &self.class)
            .field("resolver", &self.resolver.name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryEnvironment, MemoryResolver, UnavailableResolver};

    const CLASS: &str = "Microsoft.SMS.TSEnvironment";

    #[test]
    fn new_binder_is_unbound() {
        let binder = NativeObjectBinder::new(CLASS, Arc::new(UnavailableResolver));
        assert_eq!(binder.state(), BindingState::Unbound);
    }

    #[test]
    fn failed_bind_is_cached() {
        let binder = NativeObjectBinder::new(CLASS, Arc::new(UnavailableResolver));
        assert!(!binder.is_available());
        assert_eq!(binder.state(), BindingState::Unavailable);

        let err = binder.handle().unwrap_err();
        assert!(err.is_not_available());
    }

    #[test]
    fn successful_bind_constructs_once() {
        let resolver = Arc::new(MemoryResolver::new().with_object(CLASS, MemoryEnvironment::new()));
        let binder = NativeObjectBinder::new(CLASS, resolver.clone());

        assert!(binder.is_available());
        assert!(binder.is_available());
        binder
            .invoke("GetVariables", InvokeKind::Method, &mut [])
            .unwrap();

        assert_eq!(binder.state(), BindingState::Bound);
        assert_eq!(resolver.constructions(CLASS), 1);
    }

    #[test]
    fn release_returns_to_unbound() {
        let resolver = Arc::new(MemoryResolver::new().with_object(CLASS, MemoryEnvironment::new()));
        let mut binder = NativeObjectBinder::new(CLASS, resolver.clone());

        assert!(!binder.release());
        assert!(binder.is_available());
        assert!(binder.release());
        assert_eq!(binder.state(), BindingState::Unbound);

        assert!(binder.is_available());
        assert_eq!(resolver.constructions(CLASS), 2);
    }
}
