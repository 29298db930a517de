//! Transition log entity - Append-only history of workflow transitions.
//!
//! One row per accepted transition: who moved the event, from which state to
//! which, when, and the JSON evidence payload supplied for guarded
//! transitions. Rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transition log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transition_log")]
pub struct Model {
    /// Unique identifier for the log row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Event that was transitioned
    pub event_id: i64,
    /// State the event left
    pub from_state_id: i64,
    /// State the event entered
    pub to_state_id: i64,
    /// Who requested the transition
    pub actor: String,
    /// When the transition was accepted
    pub recorded_at: DateTimeUtc,
    /// JSON-serialized financial summary supplied as guard evidence, if any
    pub evidence: Option<String>,
}

/// Defines relationships between TransitionLog and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each log row belongs to one event
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
