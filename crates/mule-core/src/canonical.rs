//! Account id canonicalization for graph node identity.
//!
//! Numeric ids collapse to their integer string form, so `"00042"`, `"42.0"`
//! and `"4.2e1"` all name node `"42"`. Non-numeric ids have no canonical form.

use crate::error::CanonicalizationError;

/// Canonical integer string for a numeric account id.
///
/// Pure digit strings (with optional sign) are handled exactly at any length;
/// other numeric forms go through `f64` and are truncated toward zero.
///
/// # Examples
///
/// ```
/// use mule_core::canonical::canonicalize;
/// assert_eq!(canonicalize("00042").unwrap(), "42");
/// assert_eq!(canonicalize("42.9").unwrap(), "42");
/// assert_eq!(canonicalize("1e3").unwrap(), "1000");
/// assert!(canonicalize("ACC-1").is_err());
/// ```
pub fn canonicalize(raw: &str) -> Result<String, CanonicalizationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(CanonicalizationError::Blank);
    }

    if let Some(int) = canonical_integer(s) {
        return Ok(int);
    }

    let value: f64 = s
        .parse()
        .map_err(|_| CanonicalizationError::NotNumeric(s.to_string()))?;
    if !value.is_finite() {
        return Err(CanonicalizationError::NonFinite(s.to_string()));
    }

    let truncated = value.trunc();
    if truncated == 0.0 {
        return Ok("0".to_string());
    }
    Ok(format!("{truncated:.0}"))
}

/// Exact path for `[+-]?[0-9]+`.
fn canonical_integer(s: &str) -> Option<String> {
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        return Some("0".to_string());
    }
    if negative {
        Some(format!("-{stripped}"))
    } else {
        Some(stripped.to_string())
    }
}
