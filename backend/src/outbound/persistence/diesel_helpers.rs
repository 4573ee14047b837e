//! Error mapping shared by the Diesel store adapters.
//!
//! Both outage stores expose `connection` and `query` error constructors, so
//! the helpers take those constructors instead of naming a port error type.

use tracing::debug;

use super::models::RowDecodeError;
use super::pool::PoolError;

/// Map a pool failure onto a store's connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.into_message())
}

/// Map a Diesel failure onto a store's query or connection error.
///
/// Dropped connections become connection errors; everything else is a query
/// error carrying the operation name and the database message.
pub(crate) fn map_diesel_error<E>(
    error: diesel::result::Error,
    operation: &str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        other => debug!(error = %other, %operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            connection(format!("{operation}: {}", info.message()))
        }
        DieselError::BrokenTransactionManager => {
            connection(format!("{operation}: broken transaction manager"))
        }
        other => query(format!("{operation}: {other}")),
    }
}

/// Map a row that failed domain validation onto a store's query error.
pub(crate) fn map_decode_error<E>(error: &RowDecodeError, query: impl FnOnce(String) -> E) -> E {
    debug!(%error, "stored row failed validation");
    query(error.to_string())
}
