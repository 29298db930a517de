//! Bootstrap entry point: initializes logging, loads configuration, prepares
//! the database, and seeds the reference-data catalogs.

use dotenvy::dotenv;
use event_ledger::{config, errors::Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the reference-data catalogs from config.toml
    let states = config::states::load_default_states()?;
    let categories = config::categories::load_default_categories()?;
    info!(
        states = states.states.len(),
        categories = categories.categories.len(),
        "Loaded reference-data catalogs"
    );

    // 4. Connect and ensure the schema exists
    let db = config::database::create_connection().await?;
    config::database::create_tables(&db).await?;
    info!(url = %config::database::get_database_url(), "Database initialized");

    // 5. Seed catalogs (idempotent; existing rows are left untouched)
    let seeded_states = config::states::seed_states(&db, &states).await?;
    let seeded_categories = config::categories::seed_categories(&db, &categories).await?;
    info!(
        states = seeded_states,
        categories = seeded_categories,
        "Reference data ready"
    );

    Ok(())
}
