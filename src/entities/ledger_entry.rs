//! Ledger entry entity - A single provision, expense, or income record.
//!
//! Each entry belongs to one event and optionally references a category.
//! Amounts satisfy `total == subtotal + tax` within rounding tolerance and
//! are non-negative unless the entry is flagged as a return (devolución),
//! which represents a reversal and may carry negative amounts. Entries are
//! soft-deleted only; `is_deleted` rows are excluded from aggregation but
//! retained for audit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryKind {
    /// Planned amount reserved against a category before spending
    #[sea_orm(string_value = "provision")]
    Provision,
    /// Actual expense (`settled` means pagado)
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Income (`settled` means cobrado)
    #[sea_orm(string_value = "income")]
    Income,
}

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the event this entry belongs to
    pub event_id: i64,
    /// Category reference; None buckets under the uncategorized sentinel
    pub category_id: Option<i64>,
    /// Provision, expense, or income
    pub kind: EntryKind,
    /// Amount before tax
    pub subtotal: f64,
    /// Tax amount (round(subtotal x rate) at 2 decimals)
    pub tax: f64,
    /// Total amount, equal to subtotal + tax
    pub total: f64,
    /// Paid (pagado) for expenses, collected (cobrado) for income
    pub settled: bool,
    /// Return/devolución flag; return entries may carry negative amounts
    pub is_return: bool,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag - if true, entry is excluded from aggregation
    pub is_deleted: bool,
}

/// Defines relationships between LedgerEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one event
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    /// Each entry optionally references one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
