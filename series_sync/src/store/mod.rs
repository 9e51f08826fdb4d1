//! Keyed persistence for canonical and derived series.
//!
//! Free functions over `&mut SqliteConnection`, one module per table family.
//! Callers own transactions; nothing here opens one.

pub mod bars;
pub mod overview;
pub mod rollups;
