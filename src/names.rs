//! XML name validation
//!
//! Label names, root bindings and the override marker all become element or
//! attribute names in the output. Labels and roots are checked once when a
//! schema descriptor is resolved; the marker is checked by the persister
//! before each read or write.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// Simplified XML Name production, with an optional single prefix
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\-\.0-9\u{B7}]*$",
    )
    .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NAME.is_match(name)
}

/// Check if a string is a valid element or attribute name
///
/// Accepts `local` or `prefix:local`. Prefixes are carried verbatim; no
/// namespace resolution is performed.
pub fn is_valid_name(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_valid_ncname(prefix) && is_valid_ncname(local),
        None => is_valid_ncname(name),
    }
}

/// Validate a name and return a schema error if invalid
pub fn validate_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::Schema(format!("Invalid XML name: '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("entry"));
        assert!(is_valid_name("error-list"));
        assert!(is_valid_name("my_element"));
        assert!(is_valid_name("element123"));
        assert!(is_valid_name("_element"));
        assert!(is_valid_name("xs:element"));

        assert!(!is_valid_name(""));
        assert!(!is_valid_name("123element"));
        assert!(!is_valid_name("-element"));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name(":element"));
        assert!(!is_valid_name("element:"));
    }

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(!is_valid_ncname("prefix:element"));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("element").is_ok());
        assert!(matches!(validate_name("1abc"), Err(Error::Schema(_))));
    }
}
