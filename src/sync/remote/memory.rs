//! In-process document store.
//!
//! Used as the remote double in tests and by the HTTP test server. Keeps
//! counters of writes so callers can assert steady-state behavior.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CollectionPath, Document, Fields, RemoteError, RemoteStore};

#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Fields>>>,
    creates: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create` calls so far.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `set` calls so far.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls so far.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Every document in `path`, regardless of owner.
    pub async fn documents(&self, path: &CollectionPath) -> Vec<Document> {
        let collections = self.collections.lock().await;
        collections
            .get(&path.to_string())
            .map(|docs| {
                docs.iter()
                    .map(|(key, fields)| Document {
                        key: key.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn query(
        &self,
        path: &CollectionPath,
        owner_id: &str,
    ) -> Result<Vec<Document>, RemoteError> {
        Ok(self
            .documents(path)
            .await
            .into_iter()
            .filter(|doc| doc.owner_id() == Some(owner_id))
            .collect())
    }

    async fn get(
        &self,
        path: &CollectionPath,
        key: &str,
    ) -> Result<Option<Document>, RemoteError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(&path.to_string())
            .and_then(|docs| docs.get(key))
            .map(|fields| Document {
                key: key.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn create(&self, path: &CollectionPath, fields: Fields) -> Result<String, RemoteError> {
        let key = Uuid::new_v4().simple().to_string();
        let mut collections = self.collections.lock().await;
        collections
            .entry(path.to_string())
            .or_default()
            .insert(key.clone(), fields);
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(key)
    }

    async fn set(
        &self,
        path: &CollectionPath,
        key: &str,
        fields: Fields,
    ) -> Result<(), RemoteError> {
        let mut collections = self.collections.lock().await;
        collections
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), fields);
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, key: &str) -> Result<(), RemoteError> {
        let mut collections = self.collections.lock().await;
        if let Some(docs) = collections.get_mut(&path.to_string()) {
            docs.remove(key);
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::remote::Collection;
    use serde_json::json;

    fn fields(owner: &str, name: &str) -> Fields {
        json!({ "ownerId": owner, "name": name })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_filters_by_owner() {
        let store = MemoryRemoteStore::new();
        let path = CollectionPath::root(Collection::Stores);

        store.create(&path, fields("alice", "Aldi")).await.unwrap();
        store.create(&path, fields("bob", "Lidl")).await.unwrap();

        let docs = store.query(&path, "alice").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["name"], "Aldi");
    }

    #[tokio::test]
    async fn test_set_overwrites_and_delete_removes() {
        let store = MemoryRemoteStore::new();
        let path = CollectionPath::list_items("list-1");

        let key = store.create(&path, fields("alice", "milk")).await.unwrap();
        store
            .set(&path, &key, fields("alice", "oat milk"))
            .await
            .unwrap();

        let doc = store.get(&path, &key).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "oat milk");

        store.delete(&path, &key).await.unwrap();
        assert!(store.get(&path, &key).await.unwrap().is_none());
        // missing documents delete cleanly
        store.delete(&path, &key).await.unwrap();

        assert_eq!(store.create_count(), 1);
        assert_eq!(store.set_count(), 1);
        assert_eq!(store.delete_count(), 2);
    }

    #[tokio::test]
    async fn test_nested_collections_are_isolated() {
        let store = MemoryRemoteStore::new();
        store
            .create(&CollectionPath::list_items("a"), fields("alice", "milk"))
            .await
            .unwrap();

        let other = store
            .query(&CollectionPath::list_items("b"), "alice")
            .await
            .unwrap();
        assert!(other.is_empty());
    }
}
