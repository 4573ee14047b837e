//! Outage tracking library.
//!
//! Polls a utility's outage snapshot, records each raw report once, enriches
//! new outages with census area attributes, and tracks every outage from open
//! to restored in PostgreSQL.
//!
//! - [`domain`]: outage types, ports, the reconciliation engine and the
//!   polling cycle
//! - [`outbound`]: HTTP and Diesel adapters implementing the ports
//! - [`config`]: settings loaded from flags, environment and files

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
