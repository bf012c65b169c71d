/// Input validators for login payloads

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 64;

lazy_static! {
    // Letters, digits, spaces and a few separators
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[\p{L}\p{N} ._@'-]+$").unwrap();
}

/// Validates a login username
/// - Trims surrounding whitespace
/// - Checks length constraints
/// - Rejects control characters and unexpected symbols
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username", MAX_USERNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("username"));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username"));
    }

    Ok(trimmed.to_string())
}
