//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary
//! tables based on the entity definitions. The module uses `SeaORM`'s
//! `Schema::create_table_from_entity` method to automatically generate SQL statements
//! from the entity models, so the database schema matches the Rust struct definitions
//! without requiring manual SQL.

use crate::entities::{Category, Event, LedgerEntry, TransitionLog, WorkflowState};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/event_ledger.sqlite".to_string())
}

/// Establishes a connection to the database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity
/// definitions.
///
/// Creates tables for categories, workflow states, events, ledger entries, and the
/// transition log. Reference tables come first so that rows referencing them can be
/// inserted immediately after setup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut category_table = schema.create_table_from_entity(Category);
    let mut state_table = schema.create_table_from_entity(WorkflowState);
    let mut event_table = schema.create_table_from_entity(Event);
    let mut entry_table = schema.create_table_from_entity(LedgerEntry);
    let mut log_table = schema.create_table_from_entity(TransitionLog);

    db.execute(builder.build(category_table.if_not_exists())).await?;
    db.execute(builder.build(state_table.if_not_exists())).await?;
    db.execute(builder.build(event_table.if_not_exists())).await?;
    db.execute(builder.build(entry_table.if_not_exists())).await?;
    db.execute(builder.build(log_table.if_not_exists())).await?;

    Ok(())
}
