//! FFI bindings for AGC Flowchart
//!
//! This module provides C-compatible functions for calling the classifier from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `agc_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::perturbation::PerturbationRequest;
use crate::pipeline::FlowchartProcessor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn parse_request(json: &str) -> Result<PerturbationRequest, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid perturbation JSON: {}", e))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Classify a JSON array of sample records and return the JSON report.
///
/// # Safety
/// - `samples_json` must be a valid null-terminated C string.
/// - `perturbation_json` may be NULL (no fault injected) or a valid
///   null-terminated C string holding `{start, end, agc_offset, frequency_offset}`.
/// - Returns a newly allocated string that must be freed with `agc_free_string`.
/// - Returns NULL on error; call `agc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn agc_classify_json(
    samples_json: *const c_char,
    perturbation_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let samples_str = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples string pointer");
            return ptr::null_mut();
        }
    };

    let mut processor = FlowchartProcessor::new();

    if !perturbation_json.is_null() {
        let request = match cstr_to_string(perturbation_json).map(|s| parse_request(&s)) {
            Some(Ok(request)) => request,
            Some(Err(msg)) => {
                set_last_error(&msg);
                return ptr::null_mut();
            }
            None => {
                set_last_error("Invalid perturbation string pointer");
                return ptr::null_mut();
            }
        };
        processor.apply_request(&request);
    }

    match processor.process_json(&samples_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a FlowchartProcessor
pub struct FlowchartProcessorHandle {
    processor: FlowchartProcessor,
}

/// Create a new FlowchartProcessor with default thresholds.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `agc_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn agc_processor_new() -> *mut FlowchartProcessorHandle {
    clear_last_error();

    let handle = Box::new(FlowchartProcessorHandle {
        processor: FlowchartProcessor::new(),
    });
    Box::into_raw(handle)
}

/// Free a FlowchartProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `agc_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn agc_processor_free(processor: *mut FlowchartProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Replace the processor's thresholds from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `agc_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error (see `agc_last_error`).
#[no_mangle]
pub unsafe extern "C" fn agc_processor_load_config(
    processor: *mut FlowchartProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_config(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Inject a fault for subsequent passes.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `agc_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error (see `agc_last_error`).
#[no_mangle]
pub unsafe extern "C" fn agc_processor_apply_perturbation(
    processor: *mut FlowchartProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match parse_request(&json_str) {
        Ok(request) => {
            handle.processor.apply_request(&request);
            0
        }
        Err(msg) => {
            set_last_error(&msg);
            -1
        }
    }
}

/// Remove any injected fault.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `agc_processor_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn agc_processor_clear_perturbation(
    processor: *mut FlowchartProcessorHandle,
) {
    if !processor.is_null() {
        (*processor).processor.clear_perturbation();
    }
}

/// Classify samples with the processor's thresholds and injected fault.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `agc_processor_new`.
/// - `samples_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `agc_free_string`.
/// - Returns NULL on error; call `agc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn agc_processor_classify(
    processor: *mut FlowchartProcessorHandle,
    samples_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let samples_str = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process_json(&samples_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an `agc_` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn agc_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `agc_` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn agc_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn agc_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn samples_json() -> CString {
        CString::new(
            r#"[
                {"Timestamp": "2024-01-01 00:00:00", "Frequency": 50.0, "AGC U1": 100.0, "ULSP U1": 100.0},
                {"Timestamp": "2024-01-01 00:01:00", "Frequency": 50.0, "AGC U1": 100.0, "ULSP U1": 100.0}
            ]"#,
        )
        .unwrap()
    }

    fn report_from(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = unsafe { serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap() };
        unsafe { agc_free_string(ptr) };
        value
    }

    #[test]
    fn test_ffi_classify_without_perturbation() {
        let samples = samples_json();
        let report = report_from(unsafe { agc_classify_json(samples.as_ptr(), ptr::null()) });

        assert_eq!(report["summary"]["total_rows"], 2);
        assert_eq!(report["summary"]["clear"], 2);
    }

    #[test]
    fn test_ffi_classify_with_perturbation() {
        let samples = samples_json();
        let perturbation = CString::new(
            r#"{"start": "2024-01-01 00:01:00", "end": "2024-01-01 00:01:00", "agc_offset": -20.0}"#,
        )
        .unwrap();

        let report =
            report_from(unsafe { agc_classify_json(samples.as_ptr(), perturbation.as_ptr()) });
        assert_eq!(report["rows"][1]["alarm"], "1");
        assert_eq!(report["summary"]["perturbed_rows"], 1);
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = agc_processor_new();
            assert!(!processor.is_null());

            let config = CString::new(r#"{"drift_alarm_threshold": 1}"#).unwrap();
            assert_eq!(agc_processor_load_config(processor, config.as_ptr()), 0);

            let perturbation = CString::new(
                r#"{"start": "2024-01-01 00:00:00", "end": "2024-01-01 00:05:00", "agc_offset": 3.0}"#,
            )
            .unwrap();
            assert_eq!(agc_processor_apply_perturbation(processor, perturbation.as_ptr()), 0);

            let samples = samples_json();
            let report = report_from(agc_processor_classify(processor, samples.as_ptr()));
            assert_eq!(report["summary"]["setpoint_tracking"], 2);

            agc_processor_clear_perturbation(processor);
            let report = report_from(agc_processor_classify(processor, samples.as_ptr()));
            assert_eq!(report["summary"]["setpoint_tracking"], 0);

            agc_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = agc_classify_json(invalid.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = agc_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let processor = agc_processor_new();
            let bad_config = CString::new(r#"{"drift_alarm_threshold": 0}"#).unwrap();
            assert_eq!(agc_processor_load_config(processor, bad_config.as_ptr()), -1);
            agc_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = agc_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
