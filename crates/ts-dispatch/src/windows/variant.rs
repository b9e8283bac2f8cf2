//! Conversion between dispatch values and automation `VARIANT`s.

use std::ffi::c_void;
use std::{mem, ptr};

use windows_sys::Win32::Foundation::{SysAllocStringLen, SysFreeString, SysStringLen};
use windows_sys::Win32::System::Com::SAFEARRAY;
use windows_sys::Win32::System::Ole::{
    SafeArrayGetDim, SafeArrayGetElement, SafeArrayGetLBound, SafeArrayGetUBound,
};
use windows_sys::Win32::System::Variant::{
    VARENUM, VARIANT, VT_ARRAY, VT_BOOL, VT_BSTR, VT_BYREF, VT_EMPTY, VT_I2, VT_I4, VT_INT,
    VT_NULL, VT_UI2, VT_UI4, VT_UINT, VT_VARIANT, VariantClear,
};
use windows_sys::core::BSTR;

use crate::error::{DispatchError, Result};
use crate::value::{Arg, Value};

/// A `VARIANT` that is cleared when dropped.
///
/// `repr(transparent)` so a slice of these can be handed to `IDispatch::Invoke`.
#[repr(transparent)]
pub(crate) struct OwnedVariant(VARIANT);

impl OwnedVariant {
    /// A `VT_EMPTY` variant. Also the marker for an omitted argument.
    pub(crate) fn empty() -> Self {
        // SAFETY: an all-zero VARIANT is VT_EMPTY
        Self(unsafe { mem::zeroed() })
    }

    fn with_type(vt: VARENUM) -> Self {
        let mut variant = Self::empty();
        // SAFETY: writing the discriminant of a zeroed variant
        unsafe {
            variant.0.Anonymous.Anonymous.vt = vt;
        }
        variant
    }

    /// Marshal an input argument.
    ///
    /// Output slots are handled by the caller through [`Self::by_ref`].
    pub(crate) fn from_arg(arg: &Arg) -> Self {
        match arg {
            Arg::Absent | Arg::Out(_) => Self::empty(),
            Arg::Str(s) => {
                let mut variant = Self::with_type(VT_BSTR);
                // SAFETY: VT_BSTR owns the allocated string; VariantClear frees it
                unsafe {
                    variant.0.Anonymous.Anonymous.Anonymous.bstrVal = alloc_bstr(s);
                }
                variant
            }
            Arg::U32(n) => {
                let mut variant = Self::with_type(VT_UI4);
                // SAFETY: union member matches VT_UI4
                unsafe {
                    variant.0.Anonymous.Anonymous.Anonymous.ulVal = *n;
                }
                variant
            }
            Arg::I32(n) => {
                let mut variant = Self::with_type(VT_I4);
                // SAFETY: union member matches VT_I4
                unsafe {
                    variant.0.Anonymous.Anonymous.Anonymous.lVal = *n;
                }
                variant
            }
        }
    }

    /// A `VT_BYREF | VT_VARIANT` pointing at `target`.
    ///
    /// `target` must outlive the returned variant.
    pub(crate) fn by_ref(target: *mut VARIANT) -> Self {
        let mut variant = Self::with_type(VT_BYREF | VT_VARIANT);
        // SAFETY: union member matches VT_BYREF | VT_VARIANT
        unsafe {
            variant.0.Anonymous.Anonymous.Anonymous.pvarVal = target;
        }
        variant
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut VARIANT {
        &raw mut self.0
    }

    /// Read the variant as a dispatch value.
    pub(crate) fn to_value(&self, member: &str) -> Result<Value> {
        // SAFETY: self.0 is a valid, initialized VARIANT
        unsafe { variant_to_value(&self.0, member) }
    }
}

impl Drop for OwnedVariant {
    fn drop(&mut self) {
        // SAFETY: the variant was initialized by us or by the callee
        unsafe {
            VariantClear(&raw mut self.0);
        }
    }
}

fn alloc_bstr(s: &str) -> BSTR {
    let wide: Vec<u16> = s.encode_utf16().collect();
    // SAFETY: pointer and length describe `wide`
    unsafe { SysAllocStringLen(wide.as_ptr(), wide.len() as u32) }
}

/// Copy a `BSTR` into a Rust string. A null `BSTR` is the empty string.
pub(crate) unsafe fn bstr_to_string(bstr: BSTR) -> String {
    if bstr.is_null() {
        return String::new();
    }
    // SAFETY: caller guarantees a valid BSTR; SysStringLen gives its length in u16s
    unsafe {
        let len = SysStringLen(bstr) as usize;
        String::from_utf16_lossy(std::slice::from_raw_parts(bstr, len))
    }
}

unsafe fn variant_to_value(variant: &VARIANT, member: &str) -> Result<Value> {
    // SAFETY: caller guarantees an initialized VARIANT; each arm reads the
    // union member that matches the discriminant
    unsafe {
        let inner = &variant.Anonymous.Anonymous;
        let data = &inner.Anonymous;
        match inner.vt {
            VT_EMPTY | VT_NULL => Ok(Value::Empty),
            VT_BSTR => Ok(Value::Str(bstr_to_string(data.bstrVal))),
            VT_I4 => Ok(Value::I32(data.lVal)),
            VT_INT => Ok(Value::I32(data.intVal)),
            VT_I2 => Ok(Value::I32(i32::from(data.iVal))),
            VT_UI4 => Ok(Value::U32(data.ulVal)),
            VT_UINT => Ok(Value::U32(data.uintVal)),
            VT_UI2 => Ok(Value::U32(u32::from(data.uiVal))),
            VT_BOOL => Ok(Value::Bool(data.boolVal != 0)),
            vt if vt == VT_BYREF | VT_VARIANT => {
                if data.pvarVal.is_null() {
                    Ok(Value::Empty)
                } else {
                    variant_to_value(&*data.pvarVal, member)
                }
            }
            vt => match array_element(vt) {
                Some(element) => safe_array_to_value(data.parray, element, member),
                None => Err(DispatchError::type_mismatch(member, "automation-compatible VARIANT")),
            },
        }
    }
}

/// Element type of a supported `SAFEARRAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayElement {
    Variant,
    Bstr,
}

fn array_element(vt: VARENUM) -> Option<ArrayElement> {
    if vt == VT_ARRAY | VT_VARIANT {
        Some(ArrayElement::Variant)
    } else if vt == VT_ARRAY | VT_BSTR {
        Some(ArrayElement::Bstr)
    } else {
        None
    }
}

unsafe fn safe_array_to_value(
    array: *mut SAFEARRAY,
    element: ArrayElement,
    member: &str,
) -> Result<Value> {
    if array.is_null() {
        return Ok(Value::List(Vec::new()));
    }
    // SAFETY: caller guarantees a valid SAFEARRAY whose elements match `element`
    unsafe {
        if SafeArrayGetDim(array) != 1 {
            return Err(DispatchError::type_mismatch(member, "one-dimensional array"));
        }
        let mut lower = 0i32;
        let mut upper = -1i32;
        if SafeArrayGetLBound(array, 1, &mut lower) < 0 || SafeArrayGetUBound(array, 1, &mut upper) < 0 {
            return Err(DispatchError::type_mismatch(member, "array with bounds"));
        }

        let mut items = Vec::with_capacity(usize::try_from(upper - lower + 1).unwrap_or(0));
        for index in lower..=upper {
            let read_failed = |hr: i32| {
                DispatchError::invocation(
                    member,
                    format!("reading array element {index} failed (hresult {hr:#010x})"),
                )
            };
            match element {
                ArrayElement::Variant => {
                    let mut item = OwnedVariant::empty();
                    let hr = SafeArrayGetElement(array, &index, item.as_mut_ptr().cast::<c_void>());
                    if hr < 0 {
                        return Err(read_failed(hr));
                    }
                    items.push(item.to_value(member)?);
                }
                ArrayElement::Bstr => {
                    // SafeArrayGetElement hands out a copy we must free
                    let mut bstr: BSTR = ptr::null();
                    let hr = SafeArrayGetElement(array, &index, (&raw mut bstr).cast::<c_void>());
                    if hr < 0 {
                        return Err(read_failed(hr));
                    }
                    let text = bstr_to_string(bstr);
                    if !bstr.is_null() {
                        SysFreeString(bstr);
                    }
                    items.push(Value::Str(text));
                }
            }
        }
        Ok(Value::List(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows_sys::Win32::System::Ole::{SafeArrayCreateVector, SafeArrayPutElement};

    fn string_array(items: &[&str]) -> *mut SAFEARRAY {
        // SAFETY: a fresh one-dimensional BSTR vector; PutElement copies each string
        unsafe {
            let array = SafeArrayCreateVector(VT_BSTR, 0, items.len() as u32);
            assert!(!array.is_null());
            for (index, item) in items.iter().enumerate() {
                let bstr = alloc_bstr(item);
                let index = index as i32;
                assert!(SafeArrayPutElement(array, &index, bstr.cast::<c_void>()) >= 0);
                SysFreeString(bstr);
            }
            array
        }
    }

    #[test]
    fn supported_array_elements() {
        assert_eq!(array_element(VT_ARRAY | VT_VARIANT), Some(ArrayElement::Variant));
        assert_eq!(array_element(VT_ARRAY | VT_BSTR), Some(ArrayElement::Bstr));
        assert_eq!(array_element(VT_ARRAY | VT_I4), None);
    }

    #[test]
    fn string_array_becomes_list() {
        let mut variant = OwnedVariant::with_type(VT_ARRAY | VT_BSTR);
        // SAFETY: union member matches VT_ARRAY; VariantClear destroys the array
        unsafe {
            variant.0.Anonymous.Anonymous.Anonymous.parray =
                string_array(&["OSDComputerName", "_SMSTSOrgName"]);
        }

        let value = variant.to_value("GetVariables").unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::from("OSDComputerName"), Value::from("_SMSTSOrgName")])
        );
    }

    #[test]
    fn string_round_trip() {
        let variant = OwnedVariant::from_arg(&Arg::from("Müller"));
        assert_eq!(variant.to_value("Value").unwrap(), Value::from("Müller"));
    }
}
