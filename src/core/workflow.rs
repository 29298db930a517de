//! Workflow state machine - validates and applies event state transitions.
//!
//! An event may move from state S to state T only if T's `sort_order` is
//! greater than S's (forward-only), or T is an exception state reachable from
//! any non-terminal state. Entering a settlement-guarded state ("pagados")
//! additionally requires evidence that nothing remains pending. Every
//! accepted transition is recorded as an immutable history row, and the
//! event's `version` column serializes concurrent transition attempts.

use crate::{
    core::summary::FinancialSummary,
    entities::{Event, TransitionLog, WorkflowState, event, transition_log, workflow_state},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// Result of an accepted transition: the updated event and its history row.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The event with its new state and bumped version
    pub event: event::Model,
    /// The appended transition log row
    pub record: transition_log::Model,
}

/// The ordering rule: forward-only, except exception states, and nothing
/// leaves a terminal state.
#[must_use]
pub const fn is_transition_allowed(
    current: &workflow_state::Model,
    target: &workflow_state::Model,
) -> bool {
    !current.is_terminal && (target.sort_order > current.sort_order || target.is_exception)
}

fn check_settlement_guard(
    target: &workflow_state::Model,
    evidence: Option<&FinancialSummary>,
) -> Result<()> {
    let Some(summary) = evidence else {
        return Err(Error::ValidationFailed {
            message: format!(
                "State '{}' requires settlement evidence and none was supplied",
                target.name
            ),
        });
    };

    if !summary.is_settled() {
        return Err(Error::ValidationFailed {
            message: format!(
                "Cannot enter '{}': {:.2} in expenses and {:.2} in income still pending",
                target.name, summary.gastos_pendientes, summary.ingresos_pendientes
            ),
        });
    }

    Ok(())
}

/// Validates and applies a transition for the event with the given id.
///
/// Reads the event's current state and delegates to [`apply_transition`].
pub async fn attempt_transition(
    db: &DatabaseConnection,
    event_id: i64,
    target_state_id: i64,
    actor: &str,
    evidence: Option<&FinancialSummary>,
) -> Result<TransitionOutcome> {
    let event = crate::core::event::get_event_by_id(db, event_id)
        .await?
        .ok_or_else(|| Error::EventNotFound {
            reference: event_id.to_string(),
        })?;

    apply_transition(db, &event, target_state_id, actor, evidence).await
}

/// Applies a transition against an already-read event snapshot.
///
/// The state write carries an optimistic-concurrency check on the snapshot's
/// `version`; if another transition landed in between, the write affects zero
/// rows and the call fails with [`Error::ConcurrentModification`] so the
/// caller can re-read and retry. The state update and the history insert
/// commit in one database transaction.
pub async fn apply_transition(
    db: &DatabaseConnection,
    event: &event::Model,
    target_state_id: i64,
    actor: &str,
    evidence: Option<&FinancialSummary>,
) -> Result<TransitionOutcome> {
    use sea_orm::sea_query::Expr;

    let current = WorkflowState::find_by_id(event.state_id)
        .one(db)
        .await?
        .ok_or(Error::UnknownState {
            state_id: event.state_id,
        })?;

    let target = WorkflowState::find_by_id(target_state_id)
        .one(db)
        .await?
        .ok_or(Error::UnknownState {
            state_id: target_state_id,
        })?;

    if !is_transition_allowed(&current, &target) {
        warn!(
            event = %event.code,
            from = %current.name,
            to = %target.name,
            "Rejected transition"
        );
        return Err(Error::InvalidTransition {
            from: current.name,
            to: target.name,
        });
    }

    if target.requires_settlement {
        check_settlement_guard(&target, evidence)?;
    }

    let evidence_json = evidence.map(serde_json::to_string).transpose()?;

    let txn = db.begin().await?;

    let update = Event::update_many()
        .col_expr(event::Column::StateId, Expr::value(target.id))
        .col_expr(
            event::Column::Version,
            Expr::col(event::Column::Version).add(1),
        )
        .filter(event::Column::Id.eq(event.id))
        .filter(event::Column::Version.eq(event.version))
        .exec(&txn)
        .await?;

    if update.rows_affected == 0 {
        // Dropping the transaction rolls it back
        return Err(Error::ConcurrentModification { event_id: event.id });
    }

    let record = transition_log::ActiveModel {
        event_id: Set(event.id),
        from_state_id: Set(current.id),
        to_state_id: Set(target.id),
        actor: Set(actor.to_string()),
        recorded_at: Set(chrono::Utc::now()),
        evidence: Set(evidence_json),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let updated = Event::find_by_id(event.id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::EventNotFound {
            reference: event.id.to_string(),
        })?;

    txn.commit().await?;

    info!(
        event = %updated.code,
        from = %current.name,
        to = %target.name,
        %actor,
        "Applied transition"
    );

    Ok(TransitionOutcome {
        event: updated,
        record,
    })
}

/// Returns an event's transition history, oldest first.
pub async fn transition_history(
    db: &DatabaseConnection,
    event_id: i64,
) -> Result<Vec<transition_log::Model>> {
    TransitionLog::find()
        .filter(transition_log::Column::EventId.eq(event_id))
        .order_by_asc(transition_log::Column::RecordedAt)
        .order_by_asc(transition_log::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a workflow state by name, returning None if absent.
pub async fn get_state_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<workflow_state::Model>> {
    WorkflowState::find()
        .filter(workflow_state::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ledger::{self, NewEntry};
    use crate::core::summary::{self, compute_financial_summary};
    use crate::entities::ledger_entry::EntryKind;
    use crate::test_utils::{setup_with_event, state_by_name};

    #[tokio::test]
    async fn test_forward_transition_accepted() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let cotizado = state_by_name(&db, "cotizado").await?;

        let outcome = attempt_transition(&db, event.id, cotizado.id, "ana", None).await?;

        assert_eq!(outcome.event.state_id, cotizado.id);
        assert_eq!(outcome.event.version, event.version + 1);
        assert_eq!(outcome.record.actor, "ana");
        assert_eq!(outcome.record.from_state_id, event.state_id);
        assert_eq!(outcome.record.to_state_id, cotizado.id);
        assert!(outcome.record.evidence.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_skipping_states_forward_is_allowed() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let facturado = state_by_name(&db, "facturado").await?;

        // prospecto (1) -> facturado (7): forward, no guard
        let outcome = attempt_transition(&db, event.id, facturado.id, "ana", None).await?;
        assert_eq!(outcome.event.state_id, facturado.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let cotizado = state_by_name(&db, "cotizado").await?;
        let aprobado = state_by_name(&db, "aprobado").await?;

        attempt_transition(&db, event.id, aprobado.id, "ana", None).await?;

        let result = attempt_transition(&db, event.id, cotizado.id, "ana", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { from: _, to: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_same_state_transition_rejected() -> Result<()> {
        let (db, event) = setup_with_event().await?;

        // Equal order is not forward
        let result = attempt_transition(&db, event.id, event.state_id, "ana", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { from: _, to: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_exception_state_reachable_from_anywhere() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let vencidos = state_by_name(&db, "pagos vencidos").await?;

        // prospecto is order 1, pagos vencidos order 10 would be forward anyway;
        // the interesting case is reaching it from a later state after moving past it
        // is impossible, so verify the flag instead of the ordering.
        assert!(vencidos.is_exception);

        let outcome = attempt_transition(&db, event.id, vencidos.id, "cron", None).await?;
        assert_eq!(outcome.event.state_id, vencidos.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_from_mid_pipeline() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let facturado = state_by_name(&db, "facturado").await?;
        let cancelado = state_by_name(&db, "cancelado").await?;

        attempt_transition(&db, event.id, facturado.id, "ana", None).await?;

        // cancelado (11) sits after facturado (7), but the exception flag is
        // what makes it reachable from every non-terminal state
        let outcome = attempt_transition(&db, event.id, cancelado.id, "ana", None).await?;
        assert_eq!(outcome.event.state_id, cancelado.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_exit_from_terminal_state() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let cancelado = state_by_name(&db, "cancelado").await?;
        let vencidos = state_by_name(&db, "pagos vencidos").await?;

        attempt_transition(&db, event.id, cancelado.id, "ana", None).await?;

        // Even an exception target is unreachable from a terminal state
        let result = attempt_transition(&db, event.id, vencidos.id, "ana", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { from: _, to: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_guarded_transition_requires_evidence() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let pagados = state_by_name(&db, "pagados").await?;

        let result = attempt_transition(&db, event.id, pagados.id, "ana", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ValidationFailed { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_guarded_transition_rejects_pending_expenses() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let pagados = state_by_name(&db, "pagados").await?;

        ledger::create_entry(
            &db,
            NewEntry::from_amounts(event.id, None, EntryKind::Expense, 400.0, 0.0),
        )
        .await?;
        ledger::create_entry(
            &db,
            NewEntry::from_amounts(event.id, None, EntryKind::Income, 2000.0, 0.0).settled(),
        )
        .await?;

        let summary = compute_financial_summary(&db, event.id).await?;
        assert_eq!(summary.gastos_pendientes, 400.0);

        let result = attempt_transition(&db, event.id, pagados.id, "ana", Some(&summary)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ValidationFailed { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_guarded_transition_accepts_settled_summary() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let pagados = state_by_name(&db, "pagados").await?;

        ledger::create_entry(
            &db,
            NewEntry::from_amounts(event.id, None, EntryKind::Expense, 400.0, 0.0).settled(),
        )
        .await?;
        ledger::create_entry(
            &db,
            NewEntry::from_amounts(event.id, None, EntryKind::Income, 2000.0, 0.0).settled(),
        )
        .await?;

        let summary = compute_financial_summary(&db, event.id).await?;
        assert!(summary.is_settled());

        let outcome = attempt_transition(&db, event.id, pagados.id, "ana", Some(&summary)).await?;
        assert_eq!(outcome.event.state_id, pagados.id);

        // The evidence payload is recorded verbatim in the history row
        let evidence = outcome.record.evidence.unwrap();
        let recorded: summary::FinancialSummary = serde_json::from_str(&evidence)?;
        assert_eq!(recorded, summary);

        Ok(())
    }

    #[tokio::test]
    async fn test_stale_version_fails_concurrent_modification() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let cotizado = state_by_name(&db, "cotizado").await?;
        let aprobado = state_by_name(&db, "aprobado").await?;

        // First transition bumps the version
        attempt_transition(&db, event.id, cotizado.id, "ana", None).await?;

        // Applying against the pre-transition snapshot must fail
        let result = apply_transition(&db, &event, aprobado.id, "luis", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ConcurrentModification { event_id: _ }
        ));

        // The failed attempt left no trace: state and history are unchanged
        let history = transition_history(&db, event.id).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].to_state_id, cotizado.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_target_state() -> Result<()> {
        let (db, event) = setup_with_event().await?;

        let result = attempt_transition(&db, event.id, 999, "ana", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UnknownState { state_id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_transition_history_ordered() -> Result<()> {
        let (db, event) = setup_with_event().await?;
        let cotizado = state_by_name(&db, "cotizado").await?;
        let aprobado = state_by_name(&db, "aprobado").await?;
        let facturado = state_by_name(&db, "facturado").await?;

        attempt_transition(&db, event.id, cotizado.id, "ana", None).await?;
        attempt_transition(&db, event.id, aprobado.id, "luis", None).await?;
        attempt_transition(&db, event.id, facturado.id, "ana", None).await?;

        let history = transition_history(&db, event.id).await?;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].to_state_id, cotizado.id);
        assert_eq!(history[1].to_state_id, aprobado.id);
        assert_eq!(history[2].to_state_id, facturado.id);
        assert_eq!(history[1].actor, "luis");

        Ok(())
    }

    #[tokio::test]
    async fn test_transition_missing_event() -> Result<()> {
        let (db, _event) = setup_with_event().await?;
        let cotizado = state_by_name(&db, "cotizado").await?;

        let result = attempt_transition(&db, 999, cotizado.id, "ana", None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::EventNotFound { reference: _ }
        ));

        Ok(())
    }
}
