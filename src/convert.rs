//! Zero-value to NULL conversions.
//!
//! Trivial helpers for schemas that treat the scalar zero value as NULL:
//! wrap the value in `Some` only when it is meaningful, and let the
//! `Option` impls on the codec traits render `None` as the NULL sentinel.

/// Empty string becomes `None`.
pub fn non_empty(src: String) -> Option<String> {
    if src.is_empty() { None } else { Some(src) }
}

/// Zero becomes `None`.
pub fn non_zero_i32(src: i32) -> Option<i32> {
    (src != 0).then_some(src)
}

/// Zero becomes `None`.
pub fn non_zero_i64(src: i64) -> Option<i64> {
    (src != 0).then_some(src)
}
