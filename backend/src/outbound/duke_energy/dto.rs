//! DTOs for decoding the outage map API.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{OutageEvent, OutageId};

#[derive(Debug, Deserialize)]
pub(super) struct OutagesResponseDto {
    #[serde(default)]
    pub(super) data: Vec<OutageDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OutageDto {
    pub(super) source_event_number: Value,
    pub(super) device_latitude_location: f64,
    pub(super) device_longitude_location: f64,
    #[serde(default)]
    pub(super) customers_affected_number: Option<u32>,
    #[serde(default)]
    pub(super) outage_cause: Option<String>,
    #[serde(default)]
    pub(super) convex_hull: Value,
}

/// Key pair published in the outage map's `config.prod.json`.
#[derive(Debug, Deserialize)]
pub(super) struct ProviderConfigDto {
    pub(super) consumer_key_emp: String,
    pub(super) consumer_secret_emp: String,
}

impl OutagesResponseDto {
    pub(super) fn into_domain_events(self, jurisdiction: &str) -> Result<Vec<OutageEvent>, String> {
        self.data
            .into_iter()
            .map(|outage| outage.into_domain_event(jurisdiction))
            .collect()
    }
}

impl OutageDto {
    fn into_domain_event(self, jurisdiction: &str) -> Result<OutageEvent, String> {
        let raw_id = match &self.source_event_number {
            Value::String(raw) => raw.trim().to_owned(),
            Value::Number(number) => number.to_string(),
            other => return Err(format!("unsupported sourceEventNumber: {other}")),
        };
        let outage_id =
            OutageId::new(raw_id).map_err(|error| format!("invalid sourceEventNumber: {error}"))?;
        if !self.device_latitude_location.is_finite() || !self.device_longitude_location.is_finite()
        {
            return Err(format!("outage {outage_id} includes non-finite coordinates"));
        }

        Ok(OutageEvent {
            outage_id,
            latitude: self.device_latitude_location,
            longitude: self.device_longitude_location,
            affected_customers: self.customers_affected_number.unwrap_or(0),
            cause: self.outage_cause.unwrap_or_default(),
            jurisdiction: jurisdiction.to_owned(),
            convex_hull: self.convex_hull,
        })
    }
}
