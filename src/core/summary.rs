//! Financial aggregation business logic.
//!
//! [`summarize`] is a pure function over an event's active ledger entries:
//! deterministic, idempotent, no hidden state. Malformed entries are never
//! silently coerced; they are excluded from every sum and reported back in
//! the summary's `skipped` list (and logged). [`compute_financial_summary`]
//! is the caller-facing wrapper that loads the entries and category catalog
//! for one event.

use crate::{
    core::ledger::AMOUNT_TOLERANCE,
    entities::{
        category,
        ledger_entry::{self, EntryKind},
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Breakdown bucket for entries with no (or an unknown) category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Settled/pending totals for one category.
///
/// `settled_total` is pagado for expenses and cobrado for income.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    /// Sum of settled entry totals in the category
    pub settled_total: f64,
    /// Sum of unsettled entry totals in the category
    pub pending_total: f64,
}

/// A malformed entry excluded from the sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Id of the excluded entry
    pub entry_id: i64,
    /// Which invariant the entry violated
    pub reason: String,
}

/// Financial rollup of one event's active ledger entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Sum of income totals
    pub ingresos_totales: f64,
    /// Sum of income totals where cobrado
    pub ingresos_cobrados: f64,
    /// Income still outstanding (totales - cobrados)
    pub ingresos_pendientes: f64,
    /// Sum of expense totals
    pub gastos_totales: f64,
    /// Sum of expense totals where pagado
    pub gastos_pagados: f64,
    /// Expenses still unpaid (totales - pagados)
    pub gastos_pendientes: f64,
    /// Sum of provision totals
    pub provisiones_total: f64,
    /// Provision not yet consumed by expenses (provisiones - gastos)
    pub provision_disponible: f64,
    /// Realized profit (cobrados - pagados)
    pub utilidad_real: f64,
    /// Realized margin percentage; 0 when nothing has been collected
    pub margen_real_pct: f64,
    /// Per-category expense totals, keyed by category clave
    pub gastos_por_categoria: BTreeMap<String, CategoryTotals>,
    /// Per-category income totals, keyed by category clave
    pub ingresos_por_categoria: BTreeMap<String, CategoryTotals>,
    /// Per-category provision totals, keyed by category clave
    pub provisiones_por_categoria: BTreeMap<String, f64>,
    /// Entries excluded from the sums, with reasons
    pub skipped: Vec<SkippedEntry>,
}

impl FinancialSummary {
    /// Whether nothing remains pending on either side of the ledger.
    ///
    /// This is the precondition for entering a settlement-guarded workflow
    /// state ("pagados").
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.gastos_pendientes.abs() <= AMOUNT_TOLERANCE
            && self.ingresos_pendientes.abs() <= AMOUNT_TOLERANCE
    }
}

/// Returns the reason an entry is malformed, or None if it is well-formed.
fn malformed_reason(entry: &ledger_entry::Model) -> Option<String> {
    for (field, value) in [
        ("subtotal", entry.subtotal),
        ("tax", entry.tax),
        ("total", entry.total),
    ] {
        if !value.is_finite() {
            return Some(format!("{field} is not a finite number"));
        }
    }

    if (entry.total - (entry.subtotal + entry.tax)).abs() > AMOUNT_TOLERANCE {
        return Some(format!(
            "total {} does not equal subtotal {} + tax {}",
            entry.total, entry.subtotal, entry.tax
        ));
    }

    if !entry.is_return && entry.total < 0.0 {
        return Some(format!("negative total {} on a non-return entry", entry.total));
    }

    None
}

/// Computes the financial summary of an event from its active ledger entries.
///
/// Pure function: identical inputs produce identical output. Entries are
/// bucketed per category clave; entries without a resolvable category land
/// under [`UNCATEGORIZED`]. Negative return entries net directly into their
/// category's settled/pending bucket rather than forming a separate bucket.
#[must_use]
pub fn summarize(
    entries: &[ledger_entry::Model],
    categories: &[category::Model],
) -> FinancialSummary {
    let claves: BTreeMap<i64, &str> = categories
        .iter()
        .map(|c| (c.id, c.clave.as_str()))
        .collect();

    let mut summary = FinancialSummary::default();

    for entry in entries {
        if entry.is_deleted {
            continue;
        }

        if let Some(reason) = malformed_reason(entry) {
            warn!(entry = entry.id, %reason, "Excluding malformed ledger entry from summary");
            summary.skipped.push(SkippedEntry {
                entry_id: entry.id,
                reason,
            });
            continue;
        }

        let clave = entry
            .category_id
            .and_then(|id| claves.get(&id).copied())
            .unwrap_or(UNCATEGORIZED)
            .to_string();

        match entry.kind {
            EntryKind::Provision => {
                summary.provisiones_total += entry.total;
                *summary.provisiones_por_categoria.entry(clave).or_default() += entry.total;
            }
            EntryKind::Expense => {
                summary.gastos_totales += entry.total;
                let bucket = summary.gastos_por_categoria.entry(clave).or_default();
                if entry.settled {
                    summary.gastos_pagados += entry.total;
                    bucket.settled_total += entry.total;
                } else {
                    bucket.pending_total += entry.total;
                }
            }
            EntryKind::Income => {
                summary.ingresos_totales += entry.total;
                let bucket = summary.ingresos_por_categoria.entry(clave).or_default();
                if entry.settled {
                    summary.ingresos_cobrados += entry.total;
                    bucket.settled_total += entry.total;
                } else {
                    bucket.pending_total += entry.total;
                }
            }
        }
    }

    summary.gastos_pendientes = summary.gastos_totales - summary.gastos_pagados;
    summary.ingresos_pendientes = summary.ingresos_totales - summary.ingresos_cobrados;
    summary.provision_disponible = summary.provisiones_total - summary.gastos_totales;
    summary.utilidad_real = summary.ingresos_cobrados - summary.gastos_pagados;
    summary.margen_real_pct = if summary.ingresos_cobrados == 0.0 {
        0.0
    } else {
        summary.utilidad_real / summary.ingresos_cobrados * 100.0
    };

    summary
}

/// Loads an event's active entries and the category catalog, then delegates
/// to [`summarize`].
pub async fn compute_financial_summary(
    db: &DatabaseConnection,
    event_id: i64,
) -> Result<FinancialSummary> {
    let event = crate::core::event::get_event_by_id(db, event_id)
        .await?
        .ok_or_else(|| Error::EventNotFound {
            reference: event_id.to_string(),
        })?;

    let entries = crate::core::ledger::list_active_entries(db, event.id).await?;
    let categories = crate::core::category::list_categories(db).await?;

    Ok(summarize(&entries, &categories))
}
