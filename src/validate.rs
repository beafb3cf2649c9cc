//! Input validation helpers, applied at the handler boundary before any
//! persistence call. Failures identify the offending field in the message.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ApiError;

// Same shape of check the frontend applies: scheme + non-empty remainder for
// links, a pragmatic three-part pattern for emails. Not full RFC parsing.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("url regex is valid"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Rejects empty or whitespace-only required text fields.
pub fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Checks http(s) URL well-formedness for external links.
pub fn url(field: &str, value: &str) -> Result<(), ApiError> {
    if !URL_RE.is_match(value) {
        return Err(ApiError::Validation(format!(
            "{field} must be a valid http(s) URL"
        )));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiError> {
    if !EMAIL_RE.is_match(value) {
        return Err(ApiError::Validation(
            "email must be a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Parses an RFC 3339 timestamp, reporting unparsable input as a validation
/// failure naming the field.
pub fn datetime(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::Validation(format!("{field} must be a valid RFC 3339 timestamp")))
}

/// Enforces the practice-interval invariant: when an end time exists it must be
/// strictly after the start time.
pub fn end_after_start(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    if let Some(end) = end {
        if end <= start {
            return Err(ApiError::Validation(
                "endTime must be strictly after startTime".to_string(),
            ));
        }
    }
    Ok(())
}
