//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults. The default workflow
//! state catalog mirrors the one shipped in config.toml.

use crate::{
    config::states::{StateConfig, StatesConfig, seed_states},
    core::{category, event},
    entities,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;

fn default_state(name: &str, sort_order: i32) -> StateConfig {
    StateConfig {
        name: name.to_string(),
        sort_order,
        color: "#9e9e9e".to_string(),
        is_terminal: false,
        is_exception: false,
        requires_settlement: false,
    }
}

/// The canonical workflow state catalog used across tests.
#[must_use]
pub fn default_states() -> StatesConfig {
    let mut states = vec![
        default_state("prospecto", 1),
        default_state("cotizado", 2),
        default_state("aprobado", 3),
        default_state("en planeacion", 4),
        default_state("en curso", 5),
        default_state("ejecutado", 6),
        default_state("facturado", 7),
        default_state("pagos pendiente", 8),
    ];

    let mut pagados = default_state("pagados", 9);
    pagados.is_terminal = true;
    pagados.requires_settlement = true;
    states.push(pagados);

    let mut vencidos = default_state("pagos vencidos", 10);
    vencidos.is_terminal = true;
    vencidos.is_exception = true;
    states.push(vencidos);

    let mut cancelado = default_state("cancelado", 11);
    cancelado.is_terminal = true;
    cancelado.is_exception = true;
    states.push(cancelado);

    StatesConfig { states }
}

/// Creates an in-memory `SQLite` database with all tables initialized and the
/// default workflow state catalog seeded. This is the standard setup for all
/// integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    seed_states(&db, &default_states()).await?;
    Ok(db)
}

/// Creates a test event with a default client.
pub async fn create_test_event(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::event::Model> {
    event::create_event(db, code.to_string(), "Cliente de prueba".to_string()).await
}

/// Seeds the two categories used throughout the tests (SP, MAT) and returns
/// them ordered by clave (MAT first, SP second).
pub async fn seed_test_categories(
    db: &DatabaseConnection,
) -> Result<Vec<entities::category::Model>> {
    category::create_category(db, "Servicios profesionales".to_string(), "SP".to_string()).await?;
    category::create_category(db, "Materiales".to_string(), "MAT".to_string()).await?;
    category::list_categories(db).await
}

/// Looks up a workflow state by name, failing the test if it is missing.
pub async fn state_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::workflow_state::Model> {
    crate::core::workflow::get_state_by_name(db, name)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("Test state catalog is missing '{name}'"),
        })
}

/// Sets up a complete test environment with one event in the initial state.
/// Returns (db, event) for common test scenarios.
pub async fn setup_with_event() -> Result<(DatabaseConnection, entities::event::Model)> {
    let db = setup_test_db().await?;
    let event = create_test_event(&db, "EVT-2024-001").await?;
    Ok((db, event))
}
