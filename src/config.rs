//! Observer configuration.

use serde::Deserialize;

use crate::redact::Redactor;

/// Settings for an [`Observer`](crate::middleware::Observer).
///
/// Fixed at construction and shared read-only by every request. Deserializes
/// from any serde format, with missing keys falling back to the defaults:
///
/// ```rust
/// use wiretap::ObserverConfig;
///
/// let config: ObserverConfig = serde_json::from_str(r#"{ "max_payload_length": 64 }"#).unwrap();
/// assert_eq!(config.max_payload_length, 64);
/// assert!(config.include_response_payload);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObserverConfig {
    /// Capture and log response bodies. When off, responses stream straight
    /// through without buffering.
    pub include_response_payload: bool,
    /// Byte cap applied to both captured bodies.
    pub max_payload_length: usize,
    /// Headers shown as `XXX` in the JSON record. Case-insensitive.
    pub redacted_header_names: Vec<String>,
}

impl ObserverConfig {
    pub fn with_response_payload(mut self, include: bool) -> Self {
        self.include_response_payload = include;
        self
    }

    pub fn with_max_payload_length(mut self, max: usize) -> Self {
        self.max_payload_length = max;
        self
    }

    /// Adds one header name to the redaction set.
    pub fn with_redacted_header(mut self, name: impl Into<String>) -> Self {
        self.redacted_header_names.push(name.into());
        self
    }

    /// Replaces the redaction set.
    pub fn with_redacted_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redacted_header_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn redactor(&self) -> Redactor {
        Redactor::new(&self.redacted_header_names)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            include_response_payload: true,
            max_payload_length: 1000,
            redacted_header_names: vec!["Authorization".to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ObserverConfig::default();
        assert!(config.include_response_payload);
        assert_eq!(config.max_payload_length, 1000);
        assert!(config.redactor().is_redacted("authorization"));
    }

    #[test]
    fn builder_methods() {
        let config = ObserverConfig::default()
            .with_response_payload(false)
            .with_max_payload_length(5)
            .with_redacted_header("X-Api-Key");

        assert!(!config.include_response_payload);
        assert_eq!(config.max_payload_length, 5);
        let redactor = config.redactor();
        assert!(redactor.is_redacted("x-api-key"));
        assert!(redactor.is_redacted("Authorization"));

        let replaced = config.with_redacted_headers(["cookie"]).redactor();
        assert!(replaced.is_redacted("Cookie"));
        assert!(!replaced.is_redacted("authorization"));
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: ObserverConfig = serde_json::from_str(
            r#"{ "include_response_payload": false, "redacted_header_names": ["Cookie"] }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            ObserverConfig {
                include_response_payload: false,
                max_payload_length: 1000,
                redacted_header_names: vec!["Cookie".to_owned()],
            }
        );
    }
}
