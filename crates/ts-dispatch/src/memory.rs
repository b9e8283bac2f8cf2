//! In-memory adapters.
//!
//! These adapters stand in for the host's native automation objects when the
//! code runs outside the task sequence host: in tests, on build machines, or
//! in dry runs. It includes:
//!
//! - [`MemoryResolver`]: A registry of in-process classes
//! - [`UnavailableResolver`]: Resolves nothing (the non-Windows default)
//! - [`MemoryEnvironment`]: A task sequence variable store
//! - [`MemoryProgressUi`]: A progress UI that records every call
//!
//! # Example
//!
//! ```rust
//! use ts_dispatch::{ClassId, MemoryEnvironment, MemoryResolver, Resolver};
//!
//! let env = MemoryEnvironment::new();
//! env.insert("_SMSTSOrgName", "Acme");
//!
//! let resolver = MemoryResolver::new().with_object("Microsoft.SMS.TSEnvironment", env);
//! assert!(resolver.resolve(&ClassId::new("Microsoft.SMS.TSEnvironment")).is_ok());
//! ```

pub mod environment;
pub mod progress;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use environment::MemoryEnvironment;
pub use progress::{MemoryProgressUi, RecordedCall};

use crate::error::{DispatchError, Result};
use crate::traits::{ClassDescriptor, NativeObject, Resolver};
use crate::value::ClassId;

type Factory = Arc<dyn Fn() -> Result<Box<dyn NativeObject>> + Send + Sync>;

/// Resolver that never finds a class.
///
/// Every binder built on it reports "not available".
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableResolver;

impl Resolver for UnavailableResolver {
    fn resolve(&self, class: &ClassId) -> Result<Box<dyn ClassDescriptor>> {
        Err(DispatchError::ClassNotRegistered {
            class: class.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[derive(Clone)]
struct Registration {
    factory: Factory,
    constructions: Arc<AtomicUsize>,
}

/// Registry of in-process classes.
#[derive(Clone, Default)]
pub struct MemoryResolver {
    classes: HashMap<ClassId, Registration>,
}

impl MemoryResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class whose instances share state with `object`.
    ///
    /// Each construction hands out a clone, so the caller keeps a handle to
    /// observe what the bound code did.
    #[must_use]
    pub fn with_object<T>(self, class: impl Into<ClassId>, object: T) -> Self
    where
        T: NativeObject + Clone + Sync + 'static,
    {
        self.with_factory(class, move || Ok(Box::new(object.clone())))
    }

    /// Register a class with a custom factory.
    #[must_use]
    pub fn with_factory<F>(mut self, class: impl Into<ClassId>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn NativeObject>> + Send + Sync + 'static,
    {
        self.classes.insert(
            class.into(),
            Registration {
                factory: Arc::new(factory),
                constructions: Arc::new(AtomicUsize::new(0)),
            },
        );
        self
    }

    /// Register a class that resolves but fails to construct.
    #[must_use]
    pub fn with_construction_fault(
        self,
        class: impl Into<ClassId>,
        reason: impl Into<String>,
    ) -> Self {
        let class = class.into();
        let reason = reason.into();
        let name = class.to_string();
        self.with_factory(class, move || {
            Err(DispatchError::Construction {
                class: name.clone(),
                reason: reason.clone(),
            })
        })
    }

    /// Number of construction attempts made for a class.
    #[must_use]
    pub fn constructions(&self, class: impl Into<ClassId>) -> usize {
        self.classes
            .get(&class.into())
            .map_or(0, |r| r.constructions.load(Ordering::SeqCst))
    }
}

impl Resolver for MemoryResolver {
    fn resolve(&self, class: &ClassId) -> Result<Box<dyn ClassDescriptor>> {
        let registration = self
            .classes
            .get(class)
            .ok_or_else(|| DispatchError::ClassNotRegistered {
                class: class.to_string(),
            })?;
        Ok(Box::new(MemoryClass {
            class: class.clone(),
            registration: registration.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

impl fmt::Debug for MemoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryResolver")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct MemoryClass {
    class: ClassId,
    registration: Registration,
}

impl ClassDescriptor for MemoryClass {
    fn class_id(&self) -> &ClassId {
        &self.class
    }

    fn construct(&self) -> Result<Box<dyn NativeObject>> {
        self.registration
            .constructions
            .fetch_add(1, Ordering::SeqCst);
        (self.registration.factory)()
    }
}

impl fmt::Debug for MemoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryClass")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}
