//! FFI bindings for the Vitalog engine
//!
//! This module provides C-compatible functions for calling Vitalog from a
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `vitalog_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{NaiveDate, Utc};

use crate::pipeline::{report_from_json, JournalAnalytics};
use crate::types::HealthEntry;

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

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a JSON array of entries and return a report JSON.
///
/// `today` anchors streaks and windows ("YYYY-MM-DD"); pass NULL for the
/// current UTC date. Starts from a fresh gamification state.
///
/// # Safety
/// - `entries_json` must be a valid null-terminated C string; `today` must
///   be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with
///   `vitalog_free_string`.
/// - Returns NULL on error; call `vitalog_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_report_from_json(
    entries_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let entries_str = match cstr_to_string(entries_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid entries JSON string pointer");
            return ptr::null_mut();
        }
    };

    let today_str = cstr_to_string(today);

    match report_from_json(&entries_str, today_str.as_deref()) {
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

/// Opaque handle to a JournalAnalytics processor
pub struct VitalogProcessorHandle {
    processor: JournalAnalytics,
}

/// Create a new processor with a fresh gamification state.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `vitalog_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn vitalog_processor_new() -> *mut VitalogProcessorHandle {
    clear_last_error();

    let handle = Box::new(VitalogProcessorHandle {
        processor: JournalAnalytics::new(),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitalog_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalog_processor_free(processor: *mut VitalogProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Analyze entries with a stateful processor, keeping unlock state across
/// calls.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitalog_processor_new`.
/// - `entries_json` must be a valid null-terminated C string; `today` must
///   be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with
///   `vitalog_free_string`.
/// - Returns NULL on error; call `vitalog_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_processor_process(
    processor: *mut VitalogProcessorHandle,
    entries_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let entries_str = match cstr_to_string(entries_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid entries JSON string pointer");
            return ptr::null_mut();
        }
    };

    let entries: Vec<HealthEntry> = match serde_json::from_str(&entries_str) {
        Ok(entries) => entries,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let now = Utc::now();
    let today_date = match cstr_to_string(today) {
        Some(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                set_last_error(&format!("Invalid date (expected YYYY-MM-DD): {s}"));
                return ptr::null_mut();
            }
        },
        None => now.date_naive(),
    };

    let report = handle.processor.process_at(&entries, today_date, now);
    match serde_json::to_string(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save processor gamification state to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitalog_processor_new`.
/// - Returns a newly allocated string that must be freed with
///   `vitalog_free_string`.
/// - Returns NULL on error; call `vitalog_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_processor_save_state(
    processor: *mut VitalogProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load processor gamification state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitalog_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `vitalog_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_processor_load_state(
    processor: *mut VitalogProcessorHandle,
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

    match handle.processor.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vitalog functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vitalog function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalog_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Vitalog call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitalog_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vitalog library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitalog_version() -> *const c_char {
    // Use a static CString to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymptomLog;
    use std::ffi::CString;

    fn sample_entries_json() -> CString {
        let entries: Vec<HealthEntry> = (1..=8)
            .map(|d| {
                HealthEntry::new(
                    format!("2025-06-{d:02}"),
                    "23:00",
                    "07:00",
                    7.0,
                    6.0,
                    4.0,
                    "day",
                    None,
                    SymptomLog::default(),
                )
            })
            .collect();
        CString::new(serde_json::to_string(&entries).unwrap()).unwrap()
    }

    #[test]
    fn test_ffi_report_from_json() {
        let entries = sample_entries_json();
        let today = CString::new("2025-06-08").unwrap();

        unsafe {
            let result = vitalog_report_from_json(entries.as_ptr(), today.as_ptr());
            assert!(!result.is_null());

            let report_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(report_str.contains("schema_version"));
            assert!(report_str.contains("vitalog.report.v1"));

            vitalog_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = vitalog_processor_new();
            assert!(!processor.is_null());

            let entries = sample_entries_json();
            let today = CString::new("2025-06-08").unwrap();

            let report = vitalog_processor_process(processor, entries.as_ptr(), today.as_ptr());
            assert!(!report.is_null());
            vitalog_free_string(report);

            // Save state
            let state = vitalog_processor_save_state(processor);
            assert!(!state.is_null());

            // Load state into a fresh processor
            let processor2 = vitalog_processor_new();
            let load_result = vitalog_processor_load_state(processor2, state);
            assert_eq!(load_result, 0);

            // The restored processor reports no repeat unlocks
            let report2 = vitalog_processor_process(processor2, entries.as_ptr(), today.as_ptr());
            assert!(!report2.is_null());
            let report2_str = CStr::from_ptr(report2).to_str().unwrap();
            assert!(report2_str.contains("\"newly_unlocked\":[]"));
            vitalog_free_string(report2);

            vitalog_free_string(state);
            vitalog_processor_free(processor);
            vitalog_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();

            let result = vitalog_report_from_json(invalid.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = vitalog_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = vitalog_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
