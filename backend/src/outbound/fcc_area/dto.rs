//! DTOs for decoding the FCC census area API.

use serde::Deserialize;

use crate::domain::AreaAttributes;

#[derive(Debug, Deserialize)]
pub(super) struct AreaResponseDto {
    #[serde(default)]
    pub(super) results: Vec<AreaResultDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AreaResultDto {
    pub(super) block_fips: String,
    pub(super) county_name: String,
    pub(super) state_name: String,
}

impl AreaResponseDto {
    /// First matching area, if any.
    pub(super) fn into_first_area(self) -> Option<AreaAttributes> {
        self.results.into_iter().next().map(|result| AreaAttributes {
            state: result.state_name,
            county: result.county_name,
            block_fips: result.block_fips,
        })
    }
}
