//! Event business logic - lifecycle of the aggregate root.
//!
//! Events are created once in the initial workflow state, advance through the
//! state catalog via `core::workflow`, and are only ever soft-deleted.
//! Soft-deleting an event cascades soft-deletion to its ledger entries.

use crate::{
    entities::{Event, LedgerEntry, WorkflowState, event, ledger_entry, workflow_state},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Creates a new event with a unique human-readable code, placed in the
/// initial workflow state (lowest `sort_order`).
pub async fn create_event(
    db: &DatabaseConnection,
    code: String,
    client: String,
) -> Result<event::Model> {
    let code = code.trim().to_string();
    if code.is_empty() {
        return Err(Error::Validation {
            message: "Event code cannot be empty".to_string(),
        });
    }
    if client.trim().is_empty() {
        return Err(Error::Validation {
            message: "Event client cannot be empty".to_string(),
        });
    }

    let existing = Event::find()
        .filter(event::Column::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: format!("Event code already exists: {code}"),
        });
    }

    let initial_state = WorkflowState::find()
        .order_by_asc(workflow_state::Column::SortOrder)
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: "Workflow state catalog is empty; seed it before creating events".to_string(),
        })?;

    let model = event::ActiveModel {
        code: Set(code.clone()),
        client: Set(client.trim().to_string()),
        state_id: Set(initial_state.id),
        active: Set(true),
        is_deleted: Set(false),
        created_at: Set(chrono::Utc::now()),
        version: Set(0),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    info!(code = %result.code, state = %initial_state.name, "Created event");
    Ok(result)
}

/// Finds an event by its unique id, excluding soft-deleted events.
pub async fn get_event_by_id(
    db: &DatabaseConnection,
    event_id: i64,
) -> Result<Option<event::Model>> {
    Event::find_by_id(event_id)
        .filter(event::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an event by its human-readable code, excluding soft-deleted events.
pub async fn get_event_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<event::Model>> {
    Event::find()
        .filter(event::Column::Code.eq(code))
        .filter(event::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active (non-deleted) events, ordered by code.
pub async fn list_active_events(db: &DatabaseConnection) -> Result<Vec<event::Model>> {
    Event::find()
        .filter(event::Column::IsDeleted.eq(false))
        .order_by_asc(event::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes an event and cascades soft-deletion to all of its ledger
/// entries. Nothing is physically removed; the rows stay for audit.
pub async fn soft_delete_event(db: &DatabaseConnection, event_id: i64) -> Result<()> {
    use sea_orm::sea_query::Expr;

    let txn = db.begin().await?;

    let event = Event::find_by_id(event_id)
        .filter(event::Column::IsDeleted.eq(false))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::EventNotFound {
            reference: event_id.to_string(),
        })?;

    let mut active: event::ActiveModel = event.clone().into();
    active.is_deleted = Set(true);
    active.active = Set(false);
    active.update(&txn).await?;

    LedgerEntry::update_many()
        .col_expr(ledger_entry::Column::IsDeleted, Expr::value(true))
        .filter(ledger_entry::Column::EventId.eq(event_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(code = %event.code, "Soft-deleted event and its ledger entries");
    Ok(())
}
