//! Workflow state entity - The ordered catalog of event lifecycle states.
//!
//! The catalog is a closed set shipped in `config.toml` and seeded at
//! startup. `sort_order` defines the forward-progress sequence; exception
//! states are reachable from any non-terminal state regardless of order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow state database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workflow_states")]
pub struct Model {
    /// Unique identifier for the state
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name (e.g., "prospecto", "pagados")
    #[sea_orm(unique)]
    pub name: String,
    /// Position in the forward progression sequence
    pub sort_order: i32,
    /// Display color (hex string) for rendering layers
    pub color: String,
    /// Whether the state ends the event's lifecycle
    pub is_terminal: bool,
    /// Whether the state is reachable from any non-terminal state
    /// regardless of ordering (e.g., "pagos vencidos")
    pub is_exception: bool,
    /// Whether entering this state requires settlement evidence
    /// (zero pending expenses and income)
    pub requires_settlement: bool,
}

/// Defines relationships between WorkflowState and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Many events sit in one state at a time
    #[sea_orm(has_many = "super::event::Entity")]
    Events,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
