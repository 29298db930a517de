//! Core business logic - framework-agnostic operations over the ledger.
//!
//! Everything here takes an explicitly passed database connection and returns
//! typed results; no module holds ambient state. The aggregator itself is a
//! pure function over entry slices.

pub mod category;
pub mod event;
pub mod ledger;
pub mod summary;
pub mod workflow;
