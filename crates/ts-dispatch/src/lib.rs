//! ts-dispatch: Late-bound native automation dispatch
//!
//! This crate resolves a class identifier to a native automation object,
//! constructs it lazily and exactly once, and forwards named member calls to it.
//! When the class cannot be resolved (for example, when running outside the
//! task sequence host) the binder reports "not available" instead of failing
//! at construction time.
//!
//! # Platform Support
//!
//! - **Windows**: Uses COM automation (`IDispatch`) via `windows-sys`
//! - **Everywhere**: In-memory adapters for dry runs and tests
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use ts_dispatch::{Arg, InvokeKind, MemoryEnvironment, MemoryResolver, NativeObjectBinder};
//!
//! let env = MemoryEnvironment::new();
//! env.insert("OSDComputerName", "PC01");
//!
//! let resolver = MemoryResolver::new().with_object("Microsoft.SMS.TSEnvironment", env);
//! let binder = NativeObjectBinder::new("Microsoft.SMS.TSEnvironment", Arc::new(resolver));
//!
//! assert!(binder.is_available());
//! let value = binder
//!     .invoke("Value", InvokeKind::PropertyGet, &mut [Arg::from("OSDComputerName")])
//!     .unwrap();
//! assert_eq!(value.as_str(), Some("PC01"));
//! ```

pub mod binder;
pub mod error;
pub mod memory;
pub mod traits;
pub mod value;

#[cfg(windows)]
pub mod windows;

use std::sync::Arc;

// Re-export primary types
pub use binder::{BindingState, NativeHandle, NativeObjectBinder};
pub use error::{DispatchError, Result};
pub use memory::{
    MemoryEnvironment, MemoryProgressUi, MemoryResolver, RecordedCall, UnavailableResolver,
};
pub use traits::{ClassDescriptor, NativeObject, Resolver};
pub use value::{Arg, ClassId, InvokeKind, Value};

// Platform-specific re-exports
#[cfg(windows)]
pub use windows::{ComClass, ComObject, ComResolver};

/// Create the resolver for the platform this crate was built for.
///
/// On Windows this is the COM adapter; on every other platform nothing can be
/// resolved and every binder reports "not available".
#[must_use]
pub fn native_resolver() -> Arc<dyn Resolver> {
    #[cfg(windows)]
    {
        Arc::new(ComResolver::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(UnavailableResolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn native_resolver_is_stub_off_windows() {
        let resolver = native_resolver();
        assert_eq!(resolver.name(), "unavailable");
        assert!(resolver.resolve(&ClassId::new("Microsoft.SMS.TSEnvironment")).is_err());
    }

    #[test]
    fn binder_over_native_resolver_never_panics() {
        let binder = NativeObjectBinder::new("Definitely.Not.Registered", native_resolver());
        assert!(!binder.is_available());
    }
}
