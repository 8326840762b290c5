//! Display-time header redaction.

use std::collections::HashSet;

use crate::record::Headers;

/// Replacement for a redacted header value.
pub const PLACEHOLDER: &str = "XXX";

/// Replaces the values of sensitive headers with [`PLACEHOLDER`].
///
/// Names are matched case-insensitively. Redaction always works on a copy:
/// the record's own header map is left alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redactor {
    names: HashSet<String>,
}

impl Redactor {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names.into_iter()
            .map(|name| name.as_ref().to_ascii_lowercase())
            .collect();
        Self { names }
    }

    pub fn is_redacted(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    /// A copy of `headers` with the same keys and sensitive values replaced.
    pub fn redact(&self, headers: &Headers) -> Headers {
        headers.iter()
            .map(|(name, value)| {
                let value = if self.is_redacted(name) { PLACEHOLDER } else { value.as_str() };
                (name.clone(), value.to_owned())
            })
            .collect()
    }
}

impl Default for Redactor {
    fn default() -> Self { Self::new(["Authorization"]) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Headers {
        [
            ("Authorization", "Bearer xyz"),
            ("content-type", "application/json"),
            ("X-Api-Key", "k-123"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }

    #[test]
    fn default_redacts_authorization_in_any_case() {
        let redactor = Redactor::default();
        assert!(redactor.is_redacted("authorization"));
        assert!(redactor.is_redacted("AUTHORIZATION"));
        assert!(!redactor.is_redacted("content-type"));

        let redacted = redactor.redact(&headers());
        assert_eq!(redacted["Authorization"], PLACEHOLDER);
        assert_eq!(redacted["content-type"], "application/json");
    }

    #[test]
    fn keeps_key_set_and_leaves_input_untouched() {
        let original = headers();
        let redacted = Redactor::new(["x-api-key", "authorization"]).redact(&original);

        assert_eq!(
            redacted.keys().collect::<Vec<_>>(),
            original.keys().collect::<Vec<_>>()
        );
        assert_eq!(redacted["X-Api-Key"], PLACEHOLDER);
        assert_eq!(original["X-Api-Key"], "k-123");
        assert_eq!(original["Authorization"], "Bearer xyz");
    }

    #[test]
    fn empty_set_redacts_nothing() {
        let original = headers();
        assert_eq!(Redactor::new(Vec::<String>::new()).redact(&original), original);
    }
}
