//! Driven port for issuing outage provider credentials.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

/// Request headers the outage provider expects on every snapshot call.
///
/// The header values are secrets, so `Debug` redacts them.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    authorization: String,
    cookie: Option<String>,
}

impl ProviderCredentials {
    /// Build credentials from a full `Authorization` value and an optional
    /// `Cookie` header value.
    #[must_use]
    pub fn new(authorization: impl Into<String>, cookie: Option<String>) -> Self {
        Self {
            authorization: authorization.into(),
            cookie,
        }
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Value for the `Cookie` header, when the provider set any cookies.
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("authorization", &"<redacted>")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

define_port_error! {
    /// Errors raised while obtaining provider credentials.
    pub enum CredentialSourceError {
        /// Network transport failed before receiving a response.
        Transport {
            /// Error detail.
            message: String,
        } => "credential source transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout {
            /// Error detail.
            message: String,
        } => "credential source timeout: {message}",
        /// The provider answered with an unexpected status.
        Status {
            /// HTTP status code.
            status: u16,
            /// Error detail.
            message: String,
        } => "credential source returned status {status}: {message}",
        /// The provider configuration lacked usable key material.
        Decode {
            /// Error detail.
            message: String,
        } => "credential source response decode failed: {message}",
    }
}

/// Port issuing fresh credentials for the outage feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Obtain a fresh set of credentials.
    async fn issue(&self) -> Result<ProviderCredentials, CredentialSourceError>;
}

/// Fixture source returning static placeholder credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCredentialSource;

#[async_trait]
impl CredentialSource for FixtureCredentialSource {
    async fn issue(&self) -> Result<ProviderCredentials, CredentialSourceError> {
        Ok(ProviderCredentials::new("Basic Zml4dHVyZTpmaXh0dXJl", None))
    }
}

#[cfg(test)]
mod tests {
    //! Redaction and fixture coverage for provider credentials.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn debug_output_redacts_header_values() {
        let credentials = ProviderCredentials::new("Basic c2VjcmV0", Some("session=abc".to_owned()));

        let rendered = format!("{credentials:?}");

        assert!(!rendered.contains("c2VjcmV0"));
        assert!(!rendered.contains("session=abc"));
        assert!(rendered.contains("<redacted>"));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_issues_basic_credentials() {
        let credentials = FixtureCredentialSource
            .issue()
            .await
            .expect("fixture credentials");
        assert!(credentials.authorization().starts_with("Basic "));
        assert_eq!(credentials.cookie(), None);
    }
}
