use serde::{Deserialize, Serialize};

use super::{normalize_item_name, now_timestamp, LocalId};

/// The active shopping list. At most one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShoppingList {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub name: String,
    pub created_at: String,
}

impl ShoppingList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            remote_id: None,
            name: name.into(),
            created_at: now_timestamp(),
        }
    }
}

/// An item on the shopping list, keyed by `(list_id, item_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShoppingListItem {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub list_id: LocalId,
    pub item_name: String,
    pub checked_off: bool,
    pub position: i64,
    pub created_at: String,
}

impl ShoppingListItem {
    pub fn new(list_id: LocalId, item_name: &str) -> Self {
        Self {
            id: 0,
            remote_id: None,
            list_id,
            item_name: normalize_item_name(item_name),
            checked_off: false,
            position: 0,
            created_at: now_timestamp(),
        }
    }

    pub fn with_checked_off(mut self, checked_off: bool) -> Self {
        self.checked_off = checked_off;
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }
}
