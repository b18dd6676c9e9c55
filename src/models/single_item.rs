use serde::{Deserialize, Serialize};

use super::{now_timestamp, LocalId};

/// Catalog entry for an item name.
///
/// The catalog backs autosuggest and is the join key for list items,
/// recipe items and index weights, so a row must exist before any of
/// those reference its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SingleItem {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub item_name: String,
    pub created_at: String,
}

impl SingleItem {
    pub fn new(item_name: &str) -> Self {
        Self {
            id: 0,
            remote_id: None,
            item_name: normalize_item_name(item_name),
            created_at: now_timestamp(),
        }
    }
}

/// Canonical form of an item name: trimmed, inner whitespace collapsed,
/// lowercase.
pub fn normalize_item_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_item_name() {
        assert_eq!(normalize_item_name("  Milk "), "milk");
        assert_eq!(normalize_item_name("Greek   Yogurt"), "greek yogurt");
        assert_eq!(normalize_item_name("eggs"), "eggs");
    }

    #[test]
    fn test_new_normalizes() {
        let item = SingleItem::new("  Brown Bread");
        assert_eq!(item.item_name, "brown bread");
        assert!(item.remote_id.is_none());
    }
}
