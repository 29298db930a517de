//! Ledger entry business logic.
//!
//! Entries are validated on the way in: amounts must be finite, the total
//! must equal subtotal + tax within rounding tolerance, and only entries
//! flagged as returns may carry negative amounts. After creation an entry is
//! only ever settled/unsettled or soft-deleted, never re-parented.

use crate::{
    entities::{
        Event, LedgerEntry, category, event,
        ledger_entry::{self, EntryKind},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Tolerance for the `total == subtotal + tax` equality on 2-decimal amounts.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Computes the tax on a subtotal at the given rate, rounded to 2 decimals.
///
/// Negative subtotals (return entries) produce correspondingly negative tax.
#[must_use]
pub fn compute_tax(subtotal: f64, rate: f64) -> f64 {
    (subtotal * rate * 100.0).round() / 100.0
}

/// Input for creating a ledger entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Owning event
    pub event_id: i64,
    /// Category reference, if any
    pub category_id: Option<i64>,
    /// Provision, expense, or income
    pub kind: EntryKind,
    /// Amount before tax
    pub subtotal: f64,
    /// Tax amount
    pub tax: f64,
    /// Total amount; must equal subtotal + tax
    pub total: f64,
    /// Pagado (expense) / cobrado (income); must be false for provisions
    pub settled: bool,
    /// Return/devolución flag permitting negative amounts
    pub is_return: bool,
}

impl NewEntry {
    /// Builds an unsettled entry from explicit subtotal and tax amounts.
    #[must_use]
    pub fn from_amounts(
        event_id: i64,
        category_id: Option<i64>,
        kind: EntryKind,
        subtotal: f64,
        tax: f64,
    ) -> Self {
        Self {
            event_id,
            category_id,
            kind,
            subtotal,
            tax,
            total: subtotal + tax,
            settled: false,
            is_return: false,
        }
    }

    /// Builds an unsettled entry from a subtotal and a tax rate.
    #[must_use]
    pub fn from_rate(
        event_id: i64,
        category_id: Option<i64>,
        kind: EntryKind,
        subtotal: f64,
        rate: f64,
    ) -> Self {
        let tax = compute_tax(subtotal, rate);
        Self::from_amounts(event_id, category_id, kind, subtotal, tax)
    }

    /// Marks the entry as settled (pagado/cobrado).
    #[must_use]
    pub const fn settled(mut self) -> Self {
        self.settled = true;
        self
    }

    /// Marks the entry as a return/devolución.
    #[must_use]
    pub const fn as_return(mut self) -> Self {
        self.is_return = true;
        self
    }
}

/// Checks the amount invariants of a prospective entry.
fn validate_amounts(entry: &NewEntry) -> Result<()> {
    for (field, value) in [
        ("subtotal", entry.subtotal),
        ("tax", entry.tax),
        ("total", entry.total),
    ] {
        if !value.is_finite() {
            return Err(Error::Validation {
                message: format!("Entry {field} is not a finite number: {value}"),
            });
        }
    }

    if (entry.total - (entry.subtotal + entry.tax)).abs() > AMOUNT_TOLERANCE {
        return Err(Error::Validation {
            message: format!(
                "Entry total {} does not equal subtotal {} + tax {}",
                entry.total, entry.subtotal, entry.tax
            ),
        });
    }

    if !entry.is_return && (entry.subtotal < 0.0 || entry.tax < 0.0 || entry.total < 0.0) {
        return Err(Error::Validation {
            message: format!(
                "Negative amount on a non-return entry (total {})",
                entry.total
            ),
        });
    }

    Ok(())
}

/// Creates a new ledger entry after validating its invariants, the owning
/// event, and the referenced category.
pub async fn create_entry(db: &DatabaseConnection, new: NewEntry) -> Result<ledger_entry::Model> {
    validate_amounts(&new)?;

    if new.kind == EntryKind::Provision && new.settled {
        return Err(Error::Validation {
            message: "Provisions cannot be marked settled".to_string(),
        });
    }

    let event = Event::find_by_id(new.event_id)
        .filter(event::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| Error::EventNotFound {
            reference: new.event_id.to_string(),
        })?;

    if let Some(category_id) = new.category_id {
        let category = category::Entity::find_by_id(category_id).one(db).await?;
        if category.is_none() {
            return Err(Error::Validation {
                message: format!("Unknown category id: {category_id}"),
            });
        }
    }

    let model = ledger_entry::ActiveModel {
        event_id: Set(new.event_id),
        category_id: Set(new.category_id),
        kind: Set(new.kind),
        subtotal: Set(new.subtotal),
        tax: Set(new.tax),
        total: Set(new.total),
        settled: Set(new.settled),
        is_return: Set(new.is_return),
        created_at: Set(chrono::Utc::now()),
        is_deleted: Set(false),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    debug!(event = %event.code, entry = result.id, total = result.total, "Created ledger entry");
    Ok(result)
}

/// Retrieves all active (non-deleted) entries for an event, ordered by
/// creation time. This is the input set of the financial aggregator.
pub async fn list_active_entries(
    db: &DatabaseConnection,
    event_id: i64,
) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::EventId.eq(event_id))
        .filter(ledger_entry::Column::IsDeleted.eq(false))
        .order_by_asc(ledger_entry::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Toggles the settled (pagado/cobrado) flag of an entry. Rejected for
/// provisions, which have no settlement semantics.
pub async fn set_settled(
    db: &DatabaseConnection,
    entry_id: i64,
    settled: bool,
) -> Result<ledger_entry::Model> {
    let entry = LedgerEntry::find_by_id(entry_id)
        .filter(ledger_entry::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::EntryNotFound { id: entry_id })?;

    if entry.kind == EntryKind::Provision {
        return Err(Error::Validation {
            message: format!("Provision entry {entry_id} cannot be settled"),
        });
    }

    let mut active: ledger_entry::ActiveModel = entry.into();
    active.settled = Set(settled);
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes an entry: it disappears from aggregation but the row stays
/// for audit.
pub async fn soft_delete_entry(db: &DatabaseConnection, entry_id: i64) -> Result<()> {
    let entry = LedgerEntry::find_by_id(entry_id)
        .filter(ledger_entry::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::EntryNotFound { id: entry_id })?;

    let mut active: ledger_entry::ActiveModel = entry.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    Ok(())
}
