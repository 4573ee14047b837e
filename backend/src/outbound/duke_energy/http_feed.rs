//! Reqwest-backed outage feed adapter.
//!
//! Fetches each jurisdiction in turn and fails the whole snapshot when any
//! request fails, so a partial snapshot never reaches the engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode, Url};

use super::dto::OutagesResponseDto;
use super::{BROWSER_USER_AGENT, JSON_ACCEPT, MAP_ORIGIN, MAP_REFERER};
use crate::domain::OutageEvent;
use crate::domain::ports::{OutageFeed, OutageFeedError, ProviderCredentials};
use crate::outbound::http_support::{is_timeout_status, status_message};

/// Outage feed adapter that performs one GET per jurisdiction.
pub struct DukeEnergyOutageFeed {
    client: Client,
    endpoint: Url,
}

impl DukeEnergyOutageFeed {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    async fn fetch_jurisdiction(
        &self,
        jurisdiction: &str,
        credentials: &ProviderCredentials,
    ) -> Result<Vec<OutageEvent>, OutageFeedError> {
        let request = with_provider_headers(
            self.client.get(jurisdiction_url(&self.endpoint, jurisdiction)),
            credentials,
        );
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_outages(body.as_ref(), jurisdiction)
    }
}

#[async_trait]
impl OutageFeed for DukeEnergyOutageFeed {
    async fn fetch_snapshot(
        &self,
        jurisdictions: &[String],
        credentials: &ProviderCredentials,
    ) -> Result<Vec<OutageEvent>, OutageFeedError> {
        let mut snapshot = Vec::new();
        for jurisdiction in jurisdictions {
            let events = self.fetch_jurisdiction(jurisdiction, credentials).await?;
            tracing::debug!(jurisdiction = %jurisdiction, count = events.len(), "fetched outages");
            snapshot.extend(events);
        }
        Ok(snapshot)
    }
}

fn jurisdiction_url(endpoint: &Url, jurisdiction: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("jurisdiction", jurisdiction);
    url
}

fn with_provider_headers(
    builder: RequestBuilder,
    credentials: &ProviderCredentials,
) -> RequestBuilder {
    let request = builder
        .header(ACCEPT, JSON_ACCEPT)
        .header(ORIGIN, MAP_ORIGIN)
        .header(REFERER, MAP_REFERER)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(AUTHORIZATION, credentials.authorization());
    match credentials.cookie() {
        Some(cookie) => request.header(COOKIE, cookie),
        None => request,
    }
}

fn parse_outages(body: &[u8], jurisdiction: &str) -> Result<Vec<OutageEvent>, OutageFeedError> {
    let decoded: OutagesResponseDto = serde_json::from_slice(body).map_err(|error| {
        OutageFeedError::decode(format!(
            "invalid outage payload for {jurisdiction}: {error}"
        ))
    })?;
    decoded
        .into_domain_events(jurisdiction)
        .map_err(OutageFeedError::decode)
}

fn map_transport_error(error: reqwest::Error) -> OutageFeedError {
    if error.is_timeout() {
        OutageFeedError::timeout(error.to_string())
    } else {
        OutageFeedError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> OutageFeedError {
    let message = status_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OutageFeedError::unauthorized(message),
        _ if is_timeout_status(status) => OutageFeedError::timeout(message),
        _ => OutageFeedError::status(status.as_u16(), message),
    }
}
