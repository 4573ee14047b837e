//! PostgreSQL adapters for the outage store ports.
//!
//! Adapters only translate between Diesel rows and domain types. Row structs
//! and table definitions stay private to this module; every database failure
//! is mapped onto the owning port's error type.
//!
//! ```ignore
//! use outage_tracker::outbound::persistence::{DbPool, DieselOutageStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/outages")).await?;
//! let store = DieselOutageStore::new(pool);
//! ```

mod diesel_helpers;
mod diesel_outage_store;
mod diesel_tracker_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_outage_store::DieselOutageStore;
pub use diesel_tracker_store::DieselTrackerStore;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
