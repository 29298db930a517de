/// Category catalog loading and seeding from config.toml
pub mod categories;

/// Database configuration and connection management
pub mod database;

/// Workflow state catalog loading and seeding from config.toml
pub mod states;
