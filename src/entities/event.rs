//! Event entity - The aggregate root owning ledger entries.
//!
//! Each event has a unique human-readable code, a client reference, and a
//! current workflow state. Events are never physically deleted; `is_deleted`
//! soft-deletes them for audit integrity. The `version` column backs the
//! optimistic-concurrency check on state transitions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Unique identifier for the event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique human-readable code (e.g., "EVT-2024-001")
    #[sea_orm(unique)]
    pub code: String,
    /// Client the event belongs to
    pub client: String,
    /// Current workflow state id
    pub state_id: i64,
    /// Whether the event is active (operational flag, independent of deletion)
    pub active: bool,
    /// Soft delete flag - if true, event is hidden but data is preserved
    pub is_deleted: bool,
    /// When the event was created
    pub created_at: DateTimeUtc,
    /// Optimistic-concurrency counter, bumped on every state transition
    pub version: i32,
}

/// Defines relationships between Event and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One event owns many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
    /// One event accumulates many transition log rows
    #[sea_orm(has_many = "super::transition_log::Entity")]
    TransitionLog,
    /// Each event sits in exactly one workflow state
    #[sea_orm(
        belongs_to = "super::workflow_state::Entity",
        from = "Column::StateId",
        to = "super::workflow_state::Column::Id"
    )]
    State,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::transition_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransitionLog.def()
    }
}

impl Related<super::workflow_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::State.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
