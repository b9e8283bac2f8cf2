//! Windows COM automation adapter.
//!
//! Classes are resolved by ProgID through the COM registry and instantiated
//! with `CoCreateInstance`, asking for `IDispatch`. Members are then called by
//! name (`GetIDsOfNames` + `Invoke`), the same late binding scripting hosts use.
//!
//! # Threading
//!
//! COM is initialized in the multithreaded apartment on the thread that
//! resolves or constructs. Threads that never initialize COM use the implicit
//! MTA, so objects created there may be called from any thread of the process.
//!
//! A host thread that already joined a single-threaded apartment (script
//! hosts, UI threads) keeps it. Objects created on such a thread are pinned
//! to it: calls from any other thread fail with
//! [`DispatchError::Invocation`], and dropping the object elsewhere leaks the
//! reference instead of releasing it from the wrong apartment.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ts_dispatch::{ComResolver, NativeObjectBinder};
//!
//! let binder = NativeObjectBinder::new("Microsoft.SMS.TSEnvironment", Arc::new(ComResolver::new()));
//! if binder.is_available() {
//!     // running inside a task sequence
//! }
//! ```

mod dispatch;
mod variant;

pub use dispatch::ComObject;

use std::fmt;
use std::ptr;
use std::thread;

use windows_sys::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows_sys::Win32::System::Com::{
    CLSCTX_ALL, CLSIDFromProgID, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx,
};
use windows_sys::core::{GUID, HRESULT};

use crate::error::{DispatchError, Result};
use crate::traits::{ClassDescriptor, NativeObject, Resolver};
use crate::value::ClassId;

/// `IID_IDispatch`: {00020400-0000-0000-C000-000000000046}
const IID_IDISPATCH: GUID = GUID::from_u128(0x0002_0400_0000_0000_c000_0000_0000_0046);

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Apartment of the calling thread after [`ensure_com`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Apartment {
    Multithreaded,
    SingleThreaded,
}

fn ensure_com() -> Result<Apartment> {
    // SAFETY: reserved pointer must be null
    let hr = unsafe { CoInitializeEx(ptr::null(), COINIT_MULTITHREADED as u32) };
    // S_FALSE means this thread was already in the MTA
    if hr == RPC_E_CHANGED_MODE {
        return Ok(Apartment::SingleThreaded);
    }
    if hr < 0 {
        return Err(DispatchError::Windows {
            message: "failed to initialize COM".into(),
            code: hr,
        });
    }
    Ok(Apartment::Multithreaded)
}

pub(crate) fn describe_hresult(hr: HRESULT) -> String {
    format!("hresult {hr:#010x}")
}

/// Resolver backed by the COM class registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComResolver;

impl ComResolver {
    /// Create a COM resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Resolver for ComResolver {
    fn resolve(&self, class: &ClassId) -> Result<Box<dyn ClassDescriptor>> {
        ensure_com()?;

        let progid = wide(class.as_str());
        let mut clsid = GUID::from_u128(0);
        // SAFETY: progid is NUL-terminated and clsid is a valid out pointer
        let hr = unsafe { CLSIDFromProgID(progid.as_ptr(), &mut clsid) };
        if hr < 0 {
            tracing::debug!(class = %class, hresult = hr, "ProgID lookup failed");
            return Err(DispatchError::ClassNotRegistered {
                class: class.to_string(),
            });
        }

        Ok(Box::new(ComClass {
            class: class.clone(),
            clsid,
        }))
    }

    fn name(&self) -> &'static str {
        "com"
    }
}

/// A COM class resolved from its ProgID.
pub struct ComClass {
    class: ClassId,
    clsid: GUID,
}

impl ClassDescriptor for ComClass {
    fn class_id(&self) -> &ClassId {
        &self.class
    }

    fn construct(&self) -> Result<Box<dyn NativeObject>> {
        let owner = match ensure_com()? {
            Apartment::Multithreaded => None,
            Apartment::SingleThreaded => {
                tracing::debug!(
                    class = %self.class,
                    "creating object in a single-threaded apartment"
                );
                Some(thread::current().id())
            }
        };

        let mut raw = ptr::null_mut();
        // SAFETY: all pointers are valid; on success `raw` receives an IDispatch
        let hr = unsafe {
            CoCreateInstance(&self.clsid, ptr::null_mut(), CLSCTX_ALL, &IID_IDISPATCH, &mut raw)
        };
        if hr < 0 || raw.is_null() {
            return Err(DispatchError::Construction {
                class: self.class.to_string(),
                reason: describe_hresult(hr),
            });
        }

        // SAFETY: CoCreateInstance returned an owned IDispatch reference
        // belonging to the apartment recorded in `owner`
        Ok(Box::new(unsafe { ComObject::from_raw(self.class.clone(), raw, owner) }))
    }
}

impl fmt::Debug for ComClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.clsid;
        f.debug_struct("ComClass")
            .field("class", &self.class)
            .field(
                "clsid",
                &format_args!(
                    "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
                    g.data1,
                    g.data2,
                    g.data3,
                    g.data4[0],
                    g.data4[1],
                    g.data4[2],
                    g.data4[3],
                    g.data4[4],
                    g.data4[5],
                    g.data4[6],
                    g.data4[7]
                ),
            )
            .finish()
    }
}
