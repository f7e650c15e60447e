//! Input validation helpers
//!
//! Centralized text length constants and validation functions for store
//! configuration payloads.

use crate::utils::AppError;
use crate::utils::time::parse_time_of_day;

// ── Text length limits ──────────────────────────────────────────────

/// Store names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, comments, descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone numbers etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Validate a `HH:mm` time-of-day field.
///
/// Anything else would never match the scheduler's minute formatting and the
/// store would silently stop transitioning.
pub fn validate_time_of_day(value: &str, field: &str) -> Result<(), AppError> {
    if parse_time_of_day(value).is_none() {
        return Err(AppError::validation(format!(
            "{field} must be a HH:mm time, got '{value}'"
        )));
    }
    Ok(())
}
