//! Outbound adapters implementing the domain ports.
//!
//! - **duke_energy**: outage snapshots and credentials from the provider API
//! - **fcc_area**: census area lookups for outage coordinates
//! - **persistence**: PostgreSQL stores via Diesel
//!
//! Adapters convert between wire or row representations and domain types.
//! They hold no reconciliation logic.

pub mod duke_energy;
pub mod fcc_area;
pub(crate) mod http_support;
pub mod persistence;
