//! FFI interface for C/C++ callers
//!
//! Parses a results page and hands back the ranked records as JSON.
//! All strings cross the boundary as null-terminated UTF-8.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::config::ParserConfig;
use crate::dom::SerpDocument;
use crate::error::ParseError;
use crate::natural::{NaturalLayout, NaturalParser};

/// Result struct returned to C++
/// Both pointers are owned by Rust and must be freed via free_parse_result
#[repr(C)]
pub struct ParseResultFFI {
    /// JSON array of `{rank, types, data}` objects (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if parsing failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Parse an organic results page.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `url` - URL the page was fetched from (null-terminated)
/// * `config_json` - JSON-serialized ParserConfig (null-terminated), or null for defaults
///
/// # Returns
/// ParseResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `url` and `config_json`, when not null, must be valid null-terminated C strings
/// - Caller must free the result via `free_parse_result`
#[no_mangle]
pub unsafe extern "C" fn parse_serp(
    html_ptr: *const c_char,
    html_len: usize,
    url: *const c_char,
    config_json: *const c_char,
) -> ParseResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        String::new()
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s.to_string(),
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    let url_str = if url.is_null() {
        return make_error_result("Page URL is null");
    } else {
        match CStr::from_ptr(url).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in page URL"),
        }
    };

    let config = if config_json.is_null() {
        ParserConfig::default()
    } else {
        let config_str = match CStr::from_ptr(config_json).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in config JSON"),
        };
        match ParserConfig::from_json(config_str) {
            Ok(c) => c,
            Err(e) => return make_error_result(&e.to_string()),
        }
    };

    match parse_to_json(&html, url_str, config) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ParseResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a ParseResultFFI returned by parse_serp
///
/// # Safety
/// - `result` must have been returned by `parse_serp`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_parse_result(result: ParseResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

/// Parse a page and serialize the ranked records
pub fn parse_to_json(html: &str, url: &str, config: ParserConfig) -> Result<String, ParseError> {
    let dom = SerpDocument::new(html, url)?;
    let mut parser = NaturalParser::new(NaturalLayout::with_config(config));
    let results = parser.parse(&dom)?;
    Ok(results.to_json().to_string())
}

// Helper to create error result
fn make_error_result(msg: &str) -> ParseResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ParseResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
