//! Input validation utilities.
//!
//! Configuration values supplied at startup are checked here before they are
//! used to recognise incoming links.

use crate::{DeeplinkError, DeeplinkResult};

/// Validates that an app scheme is a well-formed URI scheme.
///
/// Per RFC 3986 a scheme starts with an ASCII letter followed by letters,
/// digits, `+`, `-` or `.`. The web schemes `http` and `https` are rejected
/// because they would make every production link look like a custom-scheme
/// link.
///
/// # Errors
///
/// Returns `DeeplinkError::InvalidConfig` if the scheme is invalid.
pub fn validate_app_scheme(scheme: &str) -> DeeplinkResult<()> {
    const MAX_SCHEME_LEN: usize = 64;

    if scheme.trim().is_empty() {
        return Err(DeeplinkError::InvalidConfig(
            "app scheme cannot be empty".into(),
        ));
    }

    if scheme.len() > MAX_SCHEME_LEN {
        return Err(DeeplinkError::InvalidConfig(format!(
            "app scheme exceeds maximum length of {} characters",
            MAX_SCHEME_LEN
        )));
    }

    let mut bytes = scheme.bytes();
    let starts_with_letter = bytes.next().is_some_and(|b| b.is_ascii_alphabetic());
    let rest_ok = bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));

    if !starts_with_letter || !rest_ok {
        return Err(DeeplinkError::InvalidConfig(format!(
            "app scheme '{}' is not a valid URI scheme",
            scheme
        )));
    }

    if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        return Err(DeeplinkError::InvalidConfig(
            "app scheme must not be http or https".into(),
        ));
    }

    Ok(())
}
