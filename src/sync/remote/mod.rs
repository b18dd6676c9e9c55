//! Remote document store contract.
//!
//! The cloud store is a document database with five top-level collections
//! and two nested `Items` sub-collections. Documents are JSON objects; the
//! only query predicate needed is equality on the `ownerId` field.
//!
//! ```text
//! Stores/{key}
//! ShoppingLists/{key}
//! ShoppingLists/{key}/Items/{key}
//! SingleItems/{key}
//! IndexWeights/{key}
//! Recipes/{key}
//! Recipes/{key}/Items/{key}
//! ```

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Field map of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Name of the field every document is filtered on.
pub const OWNER_FIELD: &str = "ownerId";

/// Top-level collections of the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Stores,
    ShoppingLists,
    SingleItems,
    IndexWeights,
    Recipes,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Stores => "Stores",
            Collection::ShoppingLists => "ShoppingLists",
            Collection::SingleItems => "SingleItems",
            Collection::IndexWeights => "IndexWeights",
            Collection::Recipes => "Recipes",
        }
    }

    /// Parse from collection name.
    #[cfg(test)]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Stores" => Some(Collection::Stores),
            "ShoppingLists" => Some(Collection::ShoppingLists),
            "SingleItems" => Some(Collection::SingleItems),
            "IndexWeights" => Some(Collection::IndexWeights),
            "Recipes" => Some(Collection::Recipes),
            _ => None,
        }
    }
}

/// Sub-collection name under `ShoppingLists/{key}` and `Recipes/{key}`.
pub const ITEMS: &str = "Items";

/// Address of a collection, top-level or nested under a parent document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionPath {
    Root(Collection),
    Items { parent: Collection, parent_key: String },
}

impl CollectionPath {
    pub fn root(collection: Collection) -> Self {
        CollectionPath::Root(collection)
    }

    pub fn list_items(list_key: impl Into<String>) -> Self {
        CollectionPath::Items {
            parent: Collection::ShoppingLists,
            parent_key: list_key.into(),
        }
    }

    pub fn recipe_items(recipe_key: impl Into<String>) -> Self {
        CollectionPath::Items {
            parent: Collection::Recipes,
            parent_key: recipe_key.into(),
        }
    }

    /// Rebuilds a path from its segments. Only lists and recipes have
    /// nested collections.
    #[cfg(test)]
    pub fn from_segments(segments: &[&str]) -> Option<Self> {
        match segments {
            [name] => Collection::parse(name).map(CollectionPath::Root),
            [parent, parent_key, ITEMS] => match Collection::parse(parent)? {
                parent @ (Collection::ShoppingLists | Collection::Recipes) => {
                    Some(CollectionPath::Items {
                        parent,
                        parent_key: (*parent_key).to_string(),
                    })
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Path segments, e.g. `["Recipes", "abc", "Items"]`.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            CollectionPath::Root(collection) => vec![collection.name()],
            CollectionPath::Items { parent, parent_key } => {
                vec![parent.name(), parent_key.as_str(), ITEMS]
            }
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

/// A stored document and its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

impl Document {
    pub fn owner_id(&self) -> Option<&str> {
        self.fields.get(OWNER_FIELD).and_then(|v| v.as_str())
    }
}

/// Errors from a remote store call.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid remote response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Network failures and timeouts are worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Timeout(_) | RemoteError::Transport(_) => true,
            RemoteError::Status { status, .. } => *status >= 500 || *status == 429,
            RemoteError::InvalidResponse(_) => false,
        }
    }
}

/// Minimal document database interface.
///
/// `set` creates or overwrites unconditionally: there is no version check
/// and no document-level merge.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All documents in `path` whose `ownerId` equals `owner_id`.
    async fn query(
        &self,
        path: &CollectionPath,
        owner_id: &str,
    ) -> Result<Vec<Document>, RemoteError>;

    async fn get(&self, path: &CollectionPath, key: &str)
        -> Result<Option<Document>, RemoteError>;

    /// Creates a document under a store-assigned key and returns the key.
    async fn create(&self, path: &CollectionPath, fields: Fields) -> Result<String, RemoteError>;

    async fn set(&self, path: &CollectionPath, key: &str, fields: Fields)
        -> Result<(), RemoteError>;

    /// Deleting a missing document succeeds.
    async fn delete(&self, path: &CollectionPath, key: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path_display() {
        assert_eq!(CollectionPath::root(Collection::Stores).to_string(), "Stores");
        assert_eq!(
            CollectionPath::list_items("abc").to_string(),
            "ShoppingLists/abc/Items"
        );
        assert_eq!(
            CollectionPath::recipe_items("r1").to_string(),
            "Recipes/r1/Items"
        );
    }

    #[test]
    fn test_from_segments() {
        assert_eq!(
            CollectionPath::from_segments(&["Recipes", "r1", "Items"]),
            Some(CollectionPath::recipe_items("r1"))
        );
        assert_eq!(
            CollectionPath::from_segments(&["SingleItems"]),
            Some(CollectionPath::root(Collection::SingleItems))
        );
        assert_eq!(CollectionPath::from_segments(&["Stores", "s1", "Items"]), None);
        assert_eq!(CollectionPath::from_segments(&["Nope"]), None);
    }

    #[test]
    fn test_transient_classification() {
        assert!(RemoteError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(RemoteError::Transport("reset".into()).is_transient());
        assert!(RemoteError::Status {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!RemoteError::Status {
            status: 403,
            message: String::new()
        }
        .is_transient());
    }
}
