//! Credential source reading the outage map's public configuration.
//!
//! The map publishes an API key pair in `config.prod.json`. The feed expects
//! `Authorization: Basic base64(key:secret)` plus any cookies set alongside
//! that document.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::{ACCEPT, HeaderMap, ORIGIN, REFERER, SET_COOKIE, USER_AGENT};
use reqwest::{Client, StatusCode, Url};

use super::dto::ProviderConfigDto;
use super::{BROWSER_USER_AGENT, JSON_ACCEPT, MAP_ORIGIN, MAP_REFERER};
use crate::domain::ports::{CredentialSource, CredentialSourceError, ProviderCredentials};
use crate::outbound::http_support::{is_timeout_status, status_message};

/// Credential source backed by the provider configuration document.
pub struct DukeEnergyCredentialSource {
    client: Client,
    config_url: Url,
}

impl DukeEnergyCredentialSource {
    /// Build a source using a reqwest client with an explicit request timeout.
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config_url })
    }
}

#[async_trait]
impl CredentialSource for DukeEnergyCredentialSource {
    async fn issue(&self) -> Result<ProviderCredentials, CredentialSourceError> {
        let response = self
            .client
            .get(self.config_url.clone())
            .header(ACCEPT, JSON_ACCEPT)
            .header(ORIGIN, MAP_ORIGIN)
            .header(REFERER, MAP_REFERER)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let cookie = cookie_header(response.headers());
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let config: ProviderConfigDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            CredentialSourceError::decode(format!("invalid provider config: {error}"))
        })?;
        Ok(ProviderCredentials::new(basic_authorization(&config)?, cookie))
    }
}

fn basic_authorization(config: &ProviderConfigDto) -> Result<String, CredentialSourceError> {
    let key = config.consumer_key_emp.trim();
    let secret = config.consumer_secret_emp.trim();
    if key.is_empty() || secret.is_empty() {
        return Err(CredentialSourceError::decode(
            "provider config holds a blank consumer key or secret",
        ));
    }
    Ok(format!("Basic {}", STANDARD.encode(format!("{key}:{secret}"))))
}

/// Join `name=value` pairs from every `Set-Cookie` header into one `Cookie`
/// header value. Attributes such as `Path` are dropped.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let pairs = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

fn map_transport_error(error: reqwest::Error) -> CredentialSourceError {
    if error.is_timeout() {
        CredentialSourceError::timeout(error.to_string())
    } else {
        CredentialSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CredentialSourceError {
    let message = status_message(status, body);
    if is_timeout_status(status) {
        CredentialSourceError::timeout(message)
    } else {
        CredentialSourceError::status(status.as_u16(), message)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for credential assembly helpers.

    use super::*;
    use reqwest::header::HeaderValue;
    use rstest::rstest;

    fn config(key: &str, secret: &str) -> ProviderConfigDto {
        ProviderConfigDto {
            consumer_key_emp: key.to_owned(),
            consumer_secret_emp: secret.to_owned(),
        }
    }

    #[test]
    fn encodes_key_pair_as_basic_authorization() {
        let header = basic_authorization(&config("key", "secret")).expect("valid pair");
        assert_eq!(header, "Basic a2V5OnNlY3JldA==");
    }

    #[rstest]
    #[case::blank_key("", "secret")]
    #[case::blank_secret("key", "  ")]
    fn rejects_blank_key_material(#[case] key: &str, #[case] secret: &str) {
        let error = basic_authorization(&config(key, secret)).expect_err("blank pair");
        assert!(matches!(error, CredentialSourceError::Decode { .. }));
    }

    #[test]
    fn decodes_provider_config_document() {
        let body = br#"{"consumer_key_emp":"k","consumer_secret_emp":"s","other":1}"#;
        let decoded: ProviderConfigDto = serde_json::from_slice(body).expect("decode");
        assert_eq!(decoded.consumer_key_emp, "k");
    }

    #[test]
    fn joins_set_cookie_pairs_without_attributes() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("session=abc; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("lb=node-2; Secure"));

        assert_eq!(
            cookie_header(&headers).as_deref(),
            Some("session=abc; lb=node-2")
        );
    }

    #[test]
    fn no_cookies_means_no_cookie_header() {
        assert_eq!(cookie_header(&HeaderMap::new()), None);
    }

    #[rstest]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, true)]
    #[case::server_error(StatusCode::SERVICE_UNAVAILABLE, false)]
    fn maps_timeout_statuses(#[case] status: StatusCode, #[case] is_timeout: bool) {
        let error = map_status_error(status, b"");
        assert_eq!(
            matches!(error, CredentialSourceError::Timeout { .. }),
            is_timeout
        );
    }
}
