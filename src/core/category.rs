//! Category catalog operations.
//!
//! Categories are reference data: admin tooling creates them, ledger entries
//! reference them, and nothing deletes them while referenced.

use crate::{
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Creates a new category, validating that the name and clave are non-empty
/// and that the clave is not already taken.
pub async fn create_category(
    db: &DatabaseConnection,
    name: String,
    clave: String,
) -> Result<category::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Category name cannot be empty".to_string(),
        });
    }
    if clave.trim().is_empty() {
        return Err(Error::Validation {
            message: "Category clave cannot be empty".to_string(),
        });
    }

    let existing = Category::find()
        .filter(category::Column::Clave.eq(clave.trim()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: format!("Category clave already exists: {}", clave.trim()),
        });
    }

    let model = category::ActiveModel {
        name: Set(name.trim().to_string()),
        clave: Set(clave.trim().to_string()),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    Ok(result)
}

/// Retrieves the full category catalog, ordered by clave.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Clave)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by its unique clave, returning None if absent.
pub async fn get_category_by_clave(
    db: &DatabaseConnection,
    clave: &str,
) -> Result<Option<category::Model>> {
    Category::find()
        .filter(category::Column::Clave.eq(clave))
        .one(db)
        .await
        .map_err(Into::into)
}
