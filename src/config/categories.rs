//! Category catalog loading from config.toml.
//!
//! Categories are immutable reference data created by admin tooling; the
//! initial catalog ships in the configuration file and is seeded at startup.

use crate::{
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, Set, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure for the `[[categories]]` tables in config.toml
#[derive(Debug, Deserialize)]
pub struct CategoriesConfig {
    /// List of category definitions to seed
    pub categories: Vec<CategoryConfig>,
}

/// Configuration for a single category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Human-readable name
    pub name: String,
    /// Short unique key (e.g., "SP", "MAT")
    pub clave: String,
}

/// Loads the category catalog from a TOML file and validates it.
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or two
/// categories share a `clave`.
pub fn load_categories<P: AsRef<Path>>(path: P) -> Result<CategoriesConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: CategoriesConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    let mut claves = std::collections::HashSet::new();
    for cat in &config.categories {
        if cat.clave.trim().is_empty() {
            return Err(Error::Config {
                message: format!("Category '{}' has an empty clave", cat.name),
            });
        }
        if !claves.insert(cat.clave.as_str()) {
            return Err(Error::Config {
                message: format!("Duplicate category clave: {}", cat.clave),
            });
        }
    }

    Ok(config)
}

/// Loads the category catalog from the default location (./config.toml)
pub fn load_default_categories() -> Result<CategoriesConfig> {
    load_categories("config.toml")
}

/// Seeds the `categories` table, inserting categories missing by `clave`.
/// Existing rows are left untouched, so reseeding is idempotent.
pub async fn seed_categories(db: &DatabaseConnection, config: &CategoriesConfig) -> Result<usize> {
    let mut inserted = 0;

    for cat in &config.categories {
        let existing = Category::find()
            .filter(category::Column::Clave.eq(cat.clave.as_str()))
            .one(db)
            .await?;

        if existing.is_none() {
            let model = category::ActiveModel {
                name: Set(cat.name.clone()),
                clave: Set(cat.clave.clone()),
                ..Default::default()
            };
            model.insert(db).await?;
            inserted += 1;
        }
    }

    if inserted > 0 {
        info!("Seeded {inserted} categories");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_category_config() {
        let toml_str = r#"
            [[categories]]
            name = "Servicios profesionales"
            clave = "SP"

            [[categories]]
            name = "Materiales"
            clave = "MAT"
        "#;

        let config: CategoriesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].clave, "SP");
        assert_eq!(config.categories[1].name, "Materiales");
    }

    #[tokio::test]
    async fn test_seed_categories_idempotent() -> Result<()> {
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        crate::config::database::create_tables(&db).await?;

        let config = CategoriesConfig {
            categories: vec![
                CategoryConfig {
                    name: "Servicios profesionales".to_string(),
                    clave: "SP".to_string(),
                },
                CategoryConfig {
                    name: "Materiales".to_string(),
                    clave: "MAT".to_string(),
                },
            ],
        };

        assert_eq!(seed_categories(&db, &config).await?, 2);
        assert_eq!(seed_categories(&db, &config).await?, 0);

        let all = Category::find().all(&db).await?;
        assert_eq!(all.len(), 2);

        Ok(())
    }
}
