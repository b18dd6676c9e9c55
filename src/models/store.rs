use serde::{Deserialize, Serialize};

use super::{now_timestamp, LocalId};

/// A shop whose aisle layout drives item ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: LocalId,
    pub remote_id: Option<String>,
    pub name: String,
    pub created_at: String,
}

impl Store {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            remote_id: None,
            name: name.into(),
            created_at: now_timestamp(),
        }
    }
}
