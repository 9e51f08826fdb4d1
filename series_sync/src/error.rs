//! Error types for the sync engine.
//!
//! Each component returns its own enum; storage failures are split into
//! constraint violations and everything else so callers can tell "bad data
//! for this symbol" apart from "the database is unhappy".

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use market_data_ingestor::providers::ProviderError;
use thiserror::Error;

use crate::kind::SeriesKind;

/// A caller passed something the engine cannot act on. Raised before any
/// storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

impl InvalidArgument {
    /// Builds an error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors from [`crate::ingest::Ingestor`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// Unsupported category, malformed symbol.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// A write violated a key or integrity constraint. The in-flight batch
    /// was rolled back.
    #[error("constraint violation while syncing {kind} for {symbol}: {source}")]
    Constraint {
        /// Symbol being synced.
        symbol: String,
        /// Category being synced.
        kind: SeriesKind,
        /// Underlying database error.
        source: DieselError,
    },

    /// Any other database failure. The in-flight batch was rolled back.
    #[error("storage error while syncing {kind} for {symbol}: {source}")]
    Storage {
        /// Symbol being synced.
        symbol: String,
        /// Category being synced.
        kind: SeriesKind,
        /// Underlying database error.
        source: DieselError,
    },

    /// The upstream fetch failed. Nothing was written.
    #[error("source error while syncing {kind} for {symbol}: {source}")]
    Source {
        /// Symbol being synced.
        symbol: String,
        /// Category being synced.
        kind: SeriesKind,
        /// Provider failure.
        source: ProviderError,
    },
}

impl SyncError {
    pub(crate) fn from_db(symbol: &str, kind: SeriesKind, source: DieselError) -> Self {
        let symbol = symbol.to_string();
        if is_constraint(&source) {
            SyncError::Constraint {
                symbol,
                kind,
                source,
            }
        } else {
            SyncError::Storage {
                symbol,
                kind,
                source,
            }
        }
    }
}

/// Errors from [`crate::rollup::refresh_rollup`].
#[derive(Debug, Error)]
pub enum RollupError {
    /// Not a rollup resolution, malformed symbol.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// An upsert violated a constraint; the current year was rolled back.
    #[error("constraint violation while rolling up {symbol} for {year}: {source}")]
    Constraint {
        /// Symbol being aggregated.
        symbol: String,
        /// Year whose work was rolled back.
        year: i32,
        /// Underlying database error.
        source: DieselError,
    },

    /// Any other database failure; the current year was rolled back.
    #[error("storage error while rolling up {symbol}: {source}")]
    Storage {
        /// Symbol being aggregated.
        symbol: String,
        /// Year whose work was rolled back, when one was in progress.
        year: Option<i32>,
        /// Underlying database error.
        source: DieselError,
    },
}

impl RollupError {
    pub(crate) fn from_db(symbol: &str, year: Option<i32>, source: DieselError) -> Self {
        let symbol = symbol.to_string();
        match year {
            Some(year) if is_constraint(&source) => RollupError::Constraint {
                symbol,
                year,
                source,
            },
            _ => RollupError::Storage {
                symbol,
                year,
                source,
            },
        }
    }
}

/// Errors from [`crate::retrieval::Retrieval`].
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Unsupported kind, malformed symbol.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// Nothing is stored for the symbol even after a successful sync.
    #[error("no {kind} data for {symbol}")]
    NotFound {
        /// Requested symbol.
        symbol: String,
        /// Requested kind.
        kind: SeriesKind,
    },

    /// Bringing the data up to date failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Recomputing a rollup failed.
    #[error(transparent)]
    Rollup(#[from] RollupError),

    /// The final read failed.
    #[error("storage error while reading {kind} for {symbol}: {source}")]
    Storage {
        /// Requested symbol.
        symbol: String,
        /// Requested kind.
        kind: SeriesKind,
        /// Underlying database error.
        source: DieselError,
    },
}

fn is_constraint(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation,
            _
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_storage() {
        let err = SyncError::from_db("IBM", SeriesKind::Daily, DieselError::NotFound);
        assert!(matches!(err, SyncError::Storage { .. }));
        assert_eq!(
            err.to_string(),
            "storage error while syncing daily for IBM: Record not found"
        );
    }

    #[test]
    fn rollup_without_year_is_storage() {
        let err = RollupError::from_db("IBM", None, DieselError::RollbackTransaction);
        assert!(matches!(err, RollupError::Storage { year: None, .. }));
    }
}
