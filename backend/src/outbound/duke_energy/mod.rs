//! Outage map adapters.
//!
//! Provides HTTP implementations of the `OutageFeed` and `CredentialSource`
//! ports. Both send the headers the public outage map sends.

mod credentials;
mod dto;
mod http_feed;

pub use credentials::DukeEnergyCredentialSource;
pub use http_feed::DukeEnergyOutageFeed;

const JSON_ACCEPT: &str = "application/json, text/plain, */*";
const MAP_ORIGIN: &str = "https://outagemap.duke-energy.com";
const MAP_REFERER: &str = "https://outagemap.duke-energy.com/";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/76.0.3809.132 Safari/537.36";
