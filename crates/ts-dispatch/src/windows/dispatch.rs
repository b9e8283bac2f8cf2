//! Late-bound calls through `IDispatch`.

use std::collections::HashMap;
use std::ffi::c_void;
use std::thread::{self, ThreadId};
use std::{fmt, mem, ptr};

use windows_sys::Win32::Foundation::{DISP_E_EXCEPTION, SysFreeString};
use windows_sys::Win32::System::Com::{
    DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS,
    EXCEPINFO,
};
use windows_sys::Win32::System::Ole::DISPID_PROPERTYPUT;
use windows_sys::Win32::System::Variant::VARIANT;
use windows_sys::core::{GUID, HRESULT, PCWSTR};

use super::variant::{OwnedVariant, bstr_to_string};
use super::{describe_hresult, wide};
use crate::error::{DispatchError, Result};
use crate::traits::NativeObject;
use crate::value::{Arg, ClassId, InvokeKind, Value};

const IID_NULL: GUID = GUID::from_u128(0);
const LOCALE_USER_DEFAULT: u32 = 0x0400;

/// The `IDispatch` vtable (`IUnknown` methods first).
#[allow(dead_code)]
#[repr(C)]
struct IDispatchVtbl {
    query_interface:
        unsafe extern "system" fn(*mut c_void, *const GUID, *mut *mut c_void) -> HRESULT,
    add_ref: unsafe extern "system" fn(*mut c_void) -> u32,
    release: unsafe extern "system" fn(*mut c_void) -> u32,
    get_type_info_count: unsafe extern "system" fn(*mut c_void, *mut u32) -> HRESULT,
    get_type_info: unsafe extern "system" fn(*mut c_void, u32, u32, *mut *mut c_void) -> HRESULT,
    get_ids_of_names: unsafe extern "system" fn(
        *mut c_void,
        *const GUID,
        *const PCWSTR,
        u32,
        u32,
        *mut i32,
    ) -> HRESULT,
    invoke: unsafe extern "system" fn(
        *mut c_void,
        i32,
        *const GUID,
        u32,
        DISPATCH_FLAGS,
        *const DISPPARAMS,
        *mut VARIANT,
        *mut EXCEPINFO,
        *mut u32,
    ) -> HRESULT,
}

#[repr(C)]
struct RawDispatch {
    vtbl: *const IDispatchVtbl,
}

/// An owned `IDispatch` reference to a constructed COM object.
///
/// Member names are resolved to DISPIDs once and cached. An object created
/// in a single-threaded apartment only accepts calls from its owner thread.
pub struct ComObject {
    class: ClassId,
    raw: *mut RawDispatch,
    dispids: HashMap<String, i32>,
    owner: Option<ThreadId>,
}

// SAFETY: without an owner the pointer belongs to the multithreaded apartment
// and may be used from any thread. With an owner, every use of `raw` (invoke,
// DISPID lookup, release) is checked against the owner thread first. Calls
// are serialized by the binder.
unsafe impl Send for ComObject {}

/// Fail unless the current thread may use an object owned by `owner`.
fn ensure_owner_thread(owner: Option<ThreadId>, member: &str) -> Result<()> {
    match owner {
        Some(id) if id != thread::current().id() => Err(DispatchError::invocation(
            member,
            "object belongs to a single-threaded apartment on another thread",
        )),
        _ => Ok(()),
    }
}

impl ComObject {
    /// Take ownership of an `IDispatch` reference.
    ///
    /// # Safety
    ///
    /// `raw` must be a valid `IDispatch` pointer whose reference the caller
    /// transfers to the returned object. `owner` must be the creating thread
    /// when that thread is in a single-threaded apartment, `None` otherwise.
    pub(crate) unsafe fn from_raw(
        class: ClassId,
        raw: *mut c_void,
        owner: Option<ThreadId>,
    ) -> Self {
        Self {
            class,
            raw: raw.cast(),
            dispids: HashMap::new(),
            owner,
        }
    }

    fn vtbl(&self) -> &IDispatchVtbl {
        // SAFETY: raw is a live IDispatch for the lifetime of self
        unsafe { &*(*self.raw).vtbl }
    }

    fn dispid(&mut self, member: &str) -> Result<i32> {
        if let Some(&id) = self.dispids.get(member) {
            return Ok(id);
        }

        let name = wide(member);
        let names = [name.as_ptr()];
        let mut id = 0i32;
        // SAFETY: one NUL-terminated name, one output slot
        let hr = unsafe {
            (self.vtbl().get_ids_of_names)(
                self.raw.cast(),
                &IID_NULL,
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut id,
            )
        };
        if hr < 0 {
            return Err(DispatchError::unknown_member(member));
        }

        self.dispids.insert(member.to_string(), id);
        Ok(id)
    }
}

const fn dispatch_flags(kind: InvokeKind) -> DISPATCH_FLAGS {
    match kind {
        InvokeKind::Method => DISPATCH_METHOD,
        // Indexed properties are also reachable as methods
        InvokeKind::PropertyGet => DISPATCH_METHOD | DISPATCH_PROPERTYGET,
        InvokeKind::PropertyPut => DISPATCH_PROPERTYPUT,
    }
}

/// Take the description out of an `EXCEPINFO` and free its strings.
unsafe fn take_exception(info: &mut EXCEPINFO) -> String {
    // SAFETY: caller passes an EXCEPINFO filled by IDispatch::Invoke
    unsafe {
        if let Some(fill) = info.pfnDeferredFillIn {
            fill(info);
        }
        let description = bstr_to_string(info.bstrDescription);
        for bstr in [info.bstrSource, info.bstrDescription, info.bstrHelpFile] {
            if !bstr.is_null() {
                SysFreeString(bstr);
            }
        }
        if description.is_empty() {
            describe_hresult(info.scode)
        } else {
            description
        }
    }
}

impl NativeObject for ComObject {
    fn invoke(&mut self, member: &str, kind: InvokeKind, args: &mut [Arg]) -> Result<Value> {
        ensure_owner_thread(self.owner, member)?;
        let id = self.dispid(member)?;

        // Automation expects arguments right to left
        let mut out_slots: Vec<(usize, Box<OwnedVariant>)> = Vec::new();
        let mut raw_args: Vec<OwnedVariant> = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate().rev() {
            if let Arg::Out(_) = arg {
                let mut target = Box::new(OwnedVariant::empty());
                raw_args.push(OwnedVariant::by_ref(target.as_mut_ptr()));
                out_slots.push((index, target));
            } else {
                raw_args.push(OwnedVariant::from_arg(arg));
            }
        }

        let mut named_put = DISPID_PROPERTYPUT;
        let is_put = kind == InvokeKind::PropertyPut;
        let params = DISPPARAMS {
            rgvarg: raw_args.as_mut_ptr().cast::<VARIANT>(),
            rgdispidNamedArgs: if is_put { &raw mut named_put } else { ptr::null_mut() },
            cArgs: raw_args.len() as u32,
            cNamedArgs: u32::from(is_put),
        };

        let mut result = OwnedVariant::empty();
        // SAFETY: an all-zero EXCEPINFO is the documented initial state
        let mut exception: EXCEPINFO = unsafe { mem::zeroed() };
        let mut arg_error = 0u32;

        // SAFETY: every pointer refers to a live local for the duration of the call
        let hr = unsafe {
            (self.vtbl().invoke)(
                self.raw.cast(),
                id,
                &IID_NULL,
                LOCALE_USER_DEFAULT,
                dispatch_flags(kind),
                &params,
                result.as_mut_ptr(),
                &mut exception,
                &mut arg_error,
            )
        };

        if hr == DISP_E_EXCEPTION {
            // SAFETY: Invoke filled the exception record
            let reason = unsafe { take_exception(&mut exception) };
            return Err(DispatchError::invocation(member, reason));
        }
        if hr < 0 {
            return Err(DispatchError::invocation(member, describe_hresult(hr)));
        }

        drop(raw_args);
        for (index, target) in out_slots {
            args[index] = Arg::Out(target.to_value(member)?);
        }
        result.to_value(member)
    }
}

impl Drop for ComObject {
    fn drop(&mut self) {
        if ensure_owner_thread(self.owner, "Release").is_err() {
            tracing::warn!(class = %self.class, "leaking COM object dropped outside its apartment");
            return;
        }
        // SAFETY: we own exactly one reference and are in its apartment
        unsafe {
            (self.vtbl().release)(self.raw.cast());
        }
    }
}

impl fmt::Debug for ComObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComObject")
            .field("class", &self.class)
            .field("cached_dispids", &self.dispids.len())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_flags() {
        assert_eq!(dispatch_flags(InvokeKind::PropertyPut), DISPATCH_PROPERTYPUT);
        assert_eq!(dispatch_flags(InvokeKind::Method), DISPATCH_METHOD);
    }

    #[test]
    fn apartment_bound_object_rejects_other_threads() {
        let owner = Some(thread::current().id());
        assert!(ensure_owner_thread(owner, "Value").is_ok());
        assert!(ensure_owner_thread(None, "Value").is_ok());

        let err = thread::spawn(move || ensure_owner_thread(owner, "Value"))
            .join()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, DispatchError::Invocation { .. }));
    }

    #[test]
    fn mta_object_accepts_any_thread() {
        let result = thread::spawn(|| ensure_owner_thread(None, "GetVariables"))
            .join()
            .unwrap();
        assert!(result.is_ok());
    }
}
