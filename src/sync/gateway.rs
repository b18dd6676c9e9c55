//! Typed, owner-scoped access to the remote store.
//!
//! Every call is bounded by a per-call timeout; expiry surfaces as
//! [`RemoteError::Timeout`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::sync::convert::{from_document, to_fields, Remote, RemoteDoc};
use crate::sync::error::{ConvertError, SyncError};
use crate::sync::remote::{CollectionPath, RemoteError, RemoteStore};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Documents of one collection, decoded.
#[derive(Debug)]
pub struct Listing<D> {
    pub docs: Vec<Remote<D>>,
    /// Documents that failed to decode, by key.
    pub malformed: Vec<(String, ConvertError)>,
}

pub struct RemoteGateway {
    store: Arc<dyn RemoteStore>,
    owner_id: String,
    timeout: Duration,
}

impl RemoteGateway {
    pub fn new(store: Arc<dyn RemoteStore>, owner_id: impl Into<String>) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.timeout)),
        }
    }

    /// All of the owner's documents in `path`.
    pub async fn list<D: RemoteDoc>(&self, path: &CollectionPath) -> Result<Listing<D>, SyncError> {
        let documents = self
            .timed(self.store.query(path, &self.owner_id))
            .await?;

        let mut listing = Listing {
            docs: Vec::with_capacity(documents.len()),
            malformed: Vec::new(),
        };
        for document in documents {
            let key = document.key.clone();
            match from_document(document) {
                Ok(remote) => listing.docs.push(remote),
                Err(e) => listing.malformed.push((key, e)),
            }
        }
        Ok(listing)
    }

    /// Resolves a document by its remote key. Documents of other owners
    /// are reported as absent.
    pub async fn get<D: RemoteDoc>(
        &self,
        path: &CollectionPath,
        key: &str,
    ) -> Result<Option<Remote<D>>, SyncError> {
        let document = match self.timed(self.store.get(path, key)).await? {
            Some(document) if document.owner_id() == Some(self.owner_id.as_str()) => document,
            _ => return Ok(None),
        };
        Ok(Some(from_document(document)?))
    }

    /// Finds a document with the given natural key that no local row has
    /// claimed yet.
    pub async fn find_by_natural_key<D: RemoteDoc>(
        &self,
        path: &CollectionPath,
        natural_key: &str,
        claimed: &HashSet<String>,
    ) -> Result<Option<Remote<D>>, SyncError> {
        let listing = self.list::<D>(path).await?;
        Ok(listing
            .docs
            .into_iter()
            .find(|remote| {
                !claimed.contains(&remote.key)
                    && remote.doc.natural_key().as_deref() == Some(natural_key)
            }))
    }

    /// Writes a document. With a key it overwrites unconditionally; without
    /// one it creates a document and returns the assigned key.
    pub async fn put<D: RemoteDoc>(
        &self,
        path: &CollectionPath,
        key: Option<&str>,
        doc: &D,
    ) -> Result<String, SyncError> {
        let fields = to_fields(doc)?;
        let key = match key {
            Some(key) => {
                self.timed(self.store.set(path, key, fields)).await?;
                key.to_string()
            }
            None => self.timed(self.store.create(path, fields)).await?,
        };
        tracing::debug!(path = %path, key = %key, "wrote remote document");
        Ok(key)
    }

    pub async fn delete(&self, path: &CollectionPath, key: &str) -> Result<(), SyncError> {
        self.timed(self.store.delete(path, key)).await?;
        tracing::debug!(path = %path, key = %key, "deleted remote document");
        Ok(())
    }

    /// Deletes every document of the owner in `path`, decodable or not.
    /// Returns how many were deleted.
    pub async fn delete_all(&self, path: &CollectionPath) -> Result<usize, SyncError> {
        let documents = self
            .timed(self.store.query(path, &self.owner_id))
            .await?;
        for document in &documents {
            self.delete(path, &document.key).await?;
        }
        Ok(documents.len())
    }
}
