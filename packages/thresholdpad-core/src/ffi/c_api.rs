//! # C API
//!
//! C-compatible FFI functions for native hosts.
//!
//! All functions follow the naming convention: `thresholdpad_<action>`.
//! Every call is synchronous; debouncing is left to the host UI.

use std::os::raw::c_char;

use super::dispatcher::dispatch;
use super::state::{get_pad, init_pad};
use super::types::*;
use crate::PadConfig;

/// Code returned when `thresholdpad_init` is called twice
pub const ALREADY_INITIALIZED: i32 = 911;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize the pad with the threshold_crypto engine
///
/// Configuration is read from `THRESHOLDPAD_*` environment variables.
/// Must be called before any other functions.
#[no_mangle]
pub extern "C" fn thresholdpad_init() -> FfiResult {
    match init_pad(PadConfig::from_env()) {
        Ok(()) => {
            tracing::info!("Thresholdpad FFI initialized");
            FfiResult::ok_empty()
        }
        Err(()) => FfiResult::err(ALREADY_INITIALIZED, "Already initialized".to_string()),
    }
}

/// Whether `thresholdpad_init` has completed
#[no_mangle]
pub extern "C" fn thresholdpad_is_initialized() -> i32 {
    i32::from(get_pad().is_some())
}

/// Get the library version; free with `thresholdpad_free_string`
#[no_mangle]
pub extern "C" fn thresholdpad_version() -> *mut c_char {
    into_c_string(crate::version().to_string())
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Call a method by name with JSON arguments
///
/// # Arguments
/// * `method` - Method name, e.g. `"sign"`
/// * `args` - JSON object (null for none)
///
/// # Returns
/// FfiResult whose data is a JSON object; free with `thresholdpad_free_result`
///
/// # Safety
/// Both pointers must be null or valid null-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn thresholdpad_call(method: *const c_char, args: *const c_char) -> FfiResult {
    let Some(method) = cstr_to_string(method) else {
        return FfiResult::err(1, "Invalid method name".to_string());
    };
    let args = if args.is_null() {
        String::new()
    } else {
        match cstr_to_string(args) {
            Some(args) => args,
            None => return FfiResult::err(1, "Arguments are not valid UTF-8".to_string()),
        }
    };
    FfiResult::from_dispatch(dispatch(&method, &args))
}

#[cfg(test)]
mod tests {
    use super::super::dispatcher::NOT_INITIALIZED;
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_call_before_init_or_after() {
        let method = CString::new("is_busy").unwrap();
        let result = unsafe { thresholdpad_call(method.as_ptr(), std::ptr::null()) };
        // Other tests may initialize the pad concurrently.
        assert!(result.success == 1 || result.error_code == NOT_INITIALIZED);
        unsafe { thresholdpad_free_result(result) };
    }

    #[test]
    fn test_null_method() {
        let result = unsafe { thresholdpad_call(std::ptr::null(), std::ptr::null()) };
        assert_eq!(result.success, 0);
        unsafe { thresholdpad_free_result(result) };
    }

    #[test]
    fn test_init_once() {
        let first = thresholdpad_init();
        let second = thresholdpad_init();
        assert_eq!(second.error_code, ALREADY_INITIALIZED);
        assert_eq!(thresholdpad_is_initialized(), 1);
        unsafe {
            thresholdpad_free_result(first);
            thresholdpad_free_result(second);
        }
    }

    #[test]
    fn test_version_string() {
        let ptr = thresholdpad_version();
        assert_eq!(unsafe { cstr_to_string(ptr) }.as_deref(), Some(crate::version()));
        unsafe { thresholdpad_free_string(ptr) };
    }
}
