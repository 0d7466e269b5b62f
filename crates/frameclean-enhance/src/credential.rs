//! The API key for the enhancement service.

use std::fmt;

/// An opaque API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, trimming surrounding whitespace. Returns `None` if blank.
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let key = key.as_ref().trim();
        (!key.is_empty()).then(|| Self(key.to_string()))
    }

    /// The raw secret, for request headers and persistence only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_rejects_blank() {
        assert_eq!(Credential::new("  abc \n").unwrap().expose(), "abc");
        assert!(Credential::new("   ").is_none());
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("secret-key").unwrap();
        assert!(!format!("{credential:?}").contains("secret"));
    }
}
