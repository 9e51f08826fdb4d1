//! Boundary to external market-data vendors.
//!
//! [`providers::TimeSeriesSource`] is the fetch interface the sync engine
//! consumes; [`models`] holds the raw, still-unvalidated records it returns.

pub mod models;
pub mod providers;
