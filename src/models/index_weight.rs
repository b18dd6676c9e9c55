use serde::{Deserialize, Serialize};

use super::{normalize_item_name, now_timestamp, LocalId};

/// Per-store ranking weight for an item, keyed by `(item_name, store_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndexWeight {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub item_name: String,
    pub store_id: LocalId,
    pub weight: i64,
    pub created_at: String,
}

impl IndexWeight {
    pub fn new(item_name: &str, store_id: LocalId, weight: i64) -> Self {
        Self {
            id: 0,
            remote_id: None,
            item_name: normalize_item_name(item_name),
            store_id,
            weight,
            created_at: now_timestamp(),
        }
    }
}
