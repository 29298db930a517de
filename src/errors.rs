//! Unified error type for the crate.
//!
//! Aggregation degrades per-entry (malformed rows are skipped and reported),
//! everything else surfaces as one of these typed variants. No error is
//! silently swallowed.

use thiserror::Error;

/// All failure modes of the ledger, aggregator, and workflow layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input data, e.g. a negative amount on a non-return entry.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the violated invariant
        message: String,
    },

    /// Target state is not reachable from the current state.
    #[error("Invalid transition: {from} -> {to} violates the state ordering")]
    InvalidTransition {
        /// Name of the event's current state
        from: String,
        /// Name of the requested target state
        to: String,
    },

    /// Precondition for a guarded transition was not met.
    #[error("Transition validation failed: {message}")]
    ValidationFailed {
        /// Why the guard rejected the transition
        message: String,
    },

    /// Target state id is not in the workflow state catalog.
    #[error("Unknown workflow state: {state_id}")]
    UnknownState {
        /// The id that failed to resolve
        state_id: i64,
    },

    /// The event was modified concurrently; re-read and retry.
    #[error("Concurrent modification of event {event_id}: stale version")]
    ConcurrentModification {
        /// Id of the contended event
        event_id: i64,
    },

    /// Event absent or soft-deleted.
    #[error("Event not found: {reference}")]
    EventNotFound {
        /// Id or code used in the lookup
        reference: String,
    },

    /// Ledger entry absent or soft-deleted.
    #[error("Ledger entry not found: {id}")]
    EntryNotFound {
        /// Primary key used in the lookup
        id: i64,
    },

    /// Category key not present in the catalog.
    #[error("Category not found: {clave}")]
    CategoryNotFound {
        /// The category key used in the lookup
        clave: String,
    },

    /// Configuration file or environment problem.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Database error from the persistence layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Evidence payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
