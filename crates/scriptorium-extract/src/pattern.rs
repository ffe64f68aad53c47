//! Access-key pattern
//!
//! The key is printed as `<label>: <KEY>`. The label is matched
//! case-insensitively; the key itself is a run of uppercase letters and
//! digits, which is all the recognizer allowlist can produce.

use once_cell::sync::Lazy;
use regex::Regex;

/// Label preceding the key on the page
pub const DEFAULT_LABEL: &str = "acceso";

static DEFAULT_PATTERN: Lazy<KeyPattern> = Lazy::new(|| {
    KeyPattern::new(DEFAULT_LABEL).expect("default key pattern compiles")
});

/// Compiled `<label>: <KEY>` matcher
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    /// Build a matcher for `label`
    ///
    /// # Errors
    /// Returns the regex error if the resulting pattern is too large.
    pub fn new(label: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            r"(?i:{}):\s*([A-Z0-9]+)",
            regex::escape(label.trim())
        ))?;
        Ok(Self { regex })
    }

    /// First key in `text`, if any
    #[must_use]
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

impl Default for KeyPattern {
    fn default() -> Self {
        DEFAULT_PATTERN.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_key_after_label() {
        let pattern = KeyPattern::default();
        assert_eq!(
            pattern.find("CODIGO DE acceso: XR7Q9 FIN"),
            Some("XR7Q9")
        );
    }

    #[test]
    fn label_is_case_insensitive() {
        let pattern = KeyPattern::default();
        assert_eq!(pattern.find("ACCESO:AUREUS12"), Some("AUREUS12"));
        assert_eq!(pattern.find("Acceso:\n  K9"), Some("K9"));
    }

    #[test]
    fn key_must_be_uppercase_alphanumeric() {
        let pattern = KeyPattern::default();
        assert_eq!(pattern.find("acceso: ABC-123"), Some("ABC"));
        assert_eq!(pattern.find("acceso: abc"), None);
    }

    #[test]
    fn missing_label_finds_nothing() {
        let pattern = KeyPattern::default();
        assert_eq!(pattern.find("CODIGO: XR7Q9"), None);
        assert_eq!(pattern.find(""), None);
    }

    #[test]
    fn custom_label_is_escaped() {
        let pattern = KeyPattern::new("code (v2)").unwrap();
        assert_eq!(pattern.find("CODE (V2): Z1"), Some("Z1"));
    }
}
