use serde::{Deserialize, Serialize};

use super::{normalize_item_name, now_timestamp, LocalId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub name: String,
    pub created_at: String,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            remote_id: None,
            name: name.into(),
            created_at: now_timestamp(),
        }
    }
}

/// Ingredient membership, keyed by `(recipe_id, item_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeItem {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub recipe_id: LocalId,
    pub item_name: String,
    pub created_at: String,
}

impl RecipeItem {
    pub fn new(recipe_id: LocalId, item_name: &str) -> Self {
        Self {
            id: 0,
            remote_id: None,
            recipe_id,
            item_name: normalize_item_name(item_name),
            created_at: now_timestamp(),
        }
    }
}
