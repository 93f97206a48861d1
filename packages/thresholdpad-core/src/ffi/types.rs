//! # FFI Types
//!
//! C-compatible types for the native boundary.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// FFI-safe result type
///
/// Used to return results across the FFI boundary.
#[repr(C)]
pub struct FfiResult {
    /// Success flag (1 = success, 0 = error)
    pub success: i32,
    /// Error code (0 if success)
    pub error_code: i32,
    /// Error message (null if success)
    pub error_message: *mut c_char,
    /// Result data, JSON (null if error)
    pub data: *mut c_char,
}

impl FfiResult {
    /// Create a successful result with data
    pub fn ok(data: String) -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: into_c_string(data),
        }
    }

    /// Create a successful result without data
    pub fn ok_empty() -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: std::ptr::null_mut(),
        }
    }

    /// Create an error result
    pub fn err(code: i32, message: String) -> Self {
        Self {
            success: 0,
            error_code: code,
            error_message: into_c_string(message),
            data: std::ptr::null_mut(),
        }
    }

    /// Create from a dispatcher result
    pub fn from_dispatch(result: Result<String, (i32, String)>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err((code, message)) => Self::err(code, message),
        }
    }
}

/// Hand a string to C. Interior NUL bytes are dropped.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert a C string to a Rust String
///
/// # Safety
/// The caller must ensure the pointer is valid and null-terminated.
pub unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(String::from)
}

/// Free a C string allocated by Rust
///
/// # Safety
/// The pointer must have been allocated by Rust using CString::into_raw().
#[no_mangle]
pub unsafe extern "C" fn thresholdpad_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Free an FfiResult
///
/// # Safety
/// The FfiResult must have been created by Rust FFI functions.
#[no_mangle]
pub unsafe extern "C" fn thresholdpad_free_result(result: FfiResult) {
    if !result.error_message.is_null() {
        drop(CString::from_raw(result.error_message));
    }
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
}
