//! Workflow state catalog loading from config.toml.
//!
//! The state catalog is a closed, versioned set: the canonical states ship in
//! the configuration file and are seeded into the `workflow_states` table at
//! startup. Adding a state is a config change plus a reseed, never an ad-hoc
//! row insert. `sort_order` is the forward-progress invariant.

use crate::{
    entities::{WorkflowState, workflow_state},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, Set, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure for the `[[states]]` tables in config.toml
#[derive(Debug, Deserialize)]
pub struct StatesConfig {
    /// The full ordered state catalog
    pub states: Vec<StateConfig>,
}

/// Configuration for a single workflow state
#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    /// State name (e.g., "prospecto", "pagados")
    pub name: String,
    /// Position in the forward progression sequence
    pub sort_order: i32,
    /// Display color as a hex string
    pub color: String,
    /// Whether the state ends the event lifecycle
    #[serde(default)]
    pub is_terminal: bool,
    /// Whether the state is reachable from any non-terminal state
    #[serde(default)]
    pub is_exception: bool,
    /// Whether entering the state requires settlement evidence
    #[serde(default)]
    pub requires_settlement: bool,
}

/// Loads the workflow state catalog from a TOML file and validates it.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read or the TOML syntax is invalid
/// - The catalog is empty
/// - Two states share a name or a `sort_order`
pub fn load_states<P: AsRef<Path>>(path: P) -> Result<StatesConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: StatesConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    validate_states(&config)?;
    Ok(config)
}

/// Loads the state catalog from the default location (./config.toml)
pub fn load_default_states() -> Result<StatesConfig> {
    load_states("config.toml")
}

fn validate_states(config: &StatesConfig) -> Result<()> {
    if config.states.is_empty() {
        return Err(Error::Config {
            message: "State catalog is empty".to_string(),
        });
    }

    let mut names = std::collections::HashSet::new();
    let mut orders = std::collections::HashSet::new();
    for state in &config.states {
        if state.name.trim().is_empty() {
            return Err(Error::Config {
                message: "State name cannot be empty".to_string(),
            });
        }
        if !names.insert(state.name.as_str()) {
            return Err(Error::Config {
                message: format!("Duplicate state name: {}", state.name),
            });
        }
        if !orders.insert(state.sort_order) {
            return Err(Error::Config {
                message: format!("Duplicate state sort_order: {}", state.sort_order),
            });
        }
    }
    Ok(())
}

/// Seeds the `workflow_states` table from the catalog, inserting states that
/// are missing by name. Existing rows are left untouched, so reseeding is
/// idempotent.
pub async fn seed_states(db: &DatabaseConnection, config: &StatesConfig) -> Result<usize> {
    let mut inserted = 0;

    for state in &config.states {
        let existing = WorkflowState::find()
            .filter(workflow_state::Column::Name.eq(state.name.as_str()))
            .one(db)
            .await?;

        if existing.is_none() {
            let model = workflow_state::ActiveModel {
                name: Set(state.name.clone()),
                sort_order: Set(state.sort_order),
                color: Set(state.color.clone()),
                is_terminal: Set(state.is_terminal),
                is_exception: Set(state.is_exception),
                requires_settlement: Set(state.requires_settlement),
                ..Default::default()
            };
            model.insert(db).await?;
            inserted += 1;
        }
    }

    if inserted > 0 {
        info!("Seeded {inserted} workflow states");
    }
    Ok(inserted)
}
