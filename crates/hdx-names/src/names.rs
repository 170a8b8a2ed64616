//! Key name validation.
//!
//! Valid key names:
//! - Must be non-empty and at most [`MAX_KEY_NAME_LEN`] bytes
//! - Must not contain whitespace, `/`, `\`, `?`, `#`, `&` or `=`
//! - Must not start with `.` or `-`
//!
//! Names travel as query arguments and as labels in a shared account, so
//! anything that would need escaping is rejected up front.

use crate::error::{NameError, NameResult};

/// Longest accepted key name.
pub const MAX_KEY_NAME_LEN: usize = 128;

const FORBIDDEN_CHARS: &[char] = &['/', '\\', '?', '#', '&', '='];

/// Validate a key name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use hdx_names::names::validate_key_name;
///
/// assert!(validate_key_name("hdx-master-index").is_ok());
/// assert!(validate_key_name("").is_err());
/// assert!(validate_key_name("bad name").is_err());
/// ```
pub fn validate_key_name(name: &str) -> NameResult<()> {
    let invalid = |reason: String| NameError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("key name must not be empty".into()));
    }
    if name.len() > MAX_KEY_NAME_LEN {
        return Err(invalid(format!("longer than {MAX_KEY_NAME_LEN} bytes")));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace".into()));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(invalid("must not start with '.' or '-'".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_style_names() {
        assert!(validate_key_name("hdx-master-index").is_ok());
        assert!(validate_key_name("hdx-project-0190a5e2-7c1b-7d40-9a53-3f0c2b1e9d11").is_ok());
        assert!(validate_key_name("self").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            validate_key_name(""),
            Err(NameError::InvalidName { .. })
        ));
    }

    #[test]
    fn rejects_whitespace_and_separators() {
        for name in ["a b", "a\tb", "a/b", "a\\b", "a?b", "a#b", "a&b", "a=b"] {
            assert!(validate_key_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn rejects_leading_dot_or_dash() {
        assert!(validate_key_name(".hidden").is_err());
        assert!(validate_key_name("-flag").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let name = "k".repeat(MAX_KEY_NAME_LEN + 1);
        assert!(validate_key_name(&name).is_err());
        let name = "k".repeat(MAX_KEY_NAME_LEN);
        assert!(validate_key_name(&name).is_ok());
    }
}
