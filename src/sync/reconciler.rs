//! Reconciliation of the local store with the remote document store.
//!
//! [`Reconciler::synchronize`] walks [`PIPELINE`] one phase at a time. All
//! phases except the shopping list follow the same pattern:
//!
//! 1. Push every local row. Linked rows overwrite their document. Unlinked
//!    rows of entities with a natural key first look for an unclaimed
//!    document with that key and adopt it; otherwise a new document is
//!    created. Stores have no natural key and are always created. The remote write
//!    always commits before the local remote key is recorded.
//! 2. Pull every remote document no local row is linked to, resolving
//!    parent references by remote key. Documents whose parent is missing
//!    locally are skipped and reported, not treated as errors.
//!
//! The shopping list is a singleton whose items are merged by name, remote
//! wins on overlap, and then rewritten remotely from the merged local state.
//! The rewrite deletes all remote items before recreating them, so an edit
//! pushed by another device inside that window is lost.
//!
//! Calls are awaited strictly in sequence. Concurrent `synchronize()` calls
//! on the same stores must be serialized by the caller.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::db::{LocalStore, Table};
use crate::models::{LocalId, ShoppingList, ShoppingListItem, SingleItem, Synced};
use crate::sync::convert::{self, IndexWeightDoc, ListItemDoc, Remote, RemoteDoc};
use crate::sync::error::{ConvertError, Side, SyncError};
use crate::sync::gateway::{Listing, RemoteGateway};
use crate::sync::phase::{Phase, PIPELINE};
use crate::sync::remote::{Collection, CollectionPath};
use crate::sync::report::{PhaseReport, SkipReason, SyncReport};

/// A local deletion to propagate to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Store(LocalId),
    SingleItem(LocalId),
    IndexWeight(LocalId),
    Recipe(LocalId),
    RecipeItem(LocalId),
    ShoppingListItem(LocalId),
}

pub struct Reconciler {
    local: LocalStore,
    remote: RemoteGateway,
}

impl Reconciler {
    pub fn new(local: LocalStore, remote: RemoteGateway) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Runs every phase in order.
    pub async fn synchronize(&self) -> Result<SyncReport, SyncError> {
        self.run(None).await
    }

    /// Like [`synchronize`](Self::synchronize), but stops at the next phase
    /// boundary once `cancel` holds `true`. Phases already run stay applied.
    pub async fn synchronize_cancellable(
        &self,
        cancel: &watch::Receiver<bool>,
    ) -> Result<SyncReport, SyncError> {
        self.run(Some(cancel)).await
    }

    async fn run(&self, cancel: Option<&watch::Receiver<bool>>) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for phase in PIPELINE {
            if cancel.is_some_and(|c| *c.borrow()) {
                info!(next = %phase, "sync cancelled");
                return Err(SyncError::Cancelled(phase));
            }

            debug!(phase = %phase, "phase started");
            let phase_report = match self.run_phase(phase).await {
                Ok(phase_report) => phase_report,
                Err(e) => {
                    warn!(phase = %phase, error = %e, "phase failed");
                    return Err(e);
                }
            };
            info!("{}", phase_report);
            report.phases.push(phase_report);
        }

        Ok(report)
    }

    async fn run_phase(&self, phase: Phase) -> Result<PhaseReport, SyncError> {
        let mut report = PhaseReport::new(phase);
        match phase {
            Phase::Stores => self.sync_stores(&mut report).await?,
            Phase::ShoppingList => self.sync_shopping_list(&mut report).await?,
            Phase::SingleItems => self.sync_single_items(&mut report).await?,
            Phase::IndexWeights => self.sync_index_weights(&mut report).await?,
            Phase::Recipes => self.sync_recipes(&mut report).await?,
            Phase::RecipeItems => self.sync_recipe_items(&mut report).await?,
        }
        Ok(report)
    }

    // ========== Generic push / pull ==========

    async fn push_rows<R, D>(
        &self,
        table: Table,
        path: &CollectionPath,
        rows: &[R],
        report: &mut PhaseReport,
        to_doc: impl Fn(&R) -> Result<D, ConvertError>,
    ) -> Result<(), SyncError>
    where
        R: Synced,
        D: RemoteDoc,
    {
        let mut claimed: HashSet<String> = rows
            .iter()
            .filter_map(|row| row.remote_id().map(str::to_string))
            .collect();

        for row in rows {
            let doc = to_doc(row)?;
            match row.remote_id() {
                Some(key) => {
                    self.remote.put(path, Some(key), &doc).await?;
                    report.updated += 1;
                }
                None => {
                    let existing = match doc.natural_key() {
                        Some(natural_key) => {
                            self.remote
                                .find_by_natural_key::<D>(path, &natural_key, &claimed)
                                .await?
                        }
                        None => None,
                    };
                    let key = match existing {
                        Some(existing) => {
                            self.remote.put(path, Some(&existing.key), &doc).await?;
                            report.adopted += 1;
                            existing.key
                        }
                        None => {
                            let key = self.remote.put(path, None, &doc).await?;
                            report.created += 1;
                            key
                        }
                    };
                    self.local.set_remote_id(table, row.local_id(), &key).await?;
                    debug!(table = %table, id = row.local_id(), key = %key, "linked row");
                    claimed.insert(key);
                }
            }
        }
        Ok(())
    }

    /// Documents no local row is linked to. Undecodable documents that are
    /// not linked either are reported as skipped.
    fn unlinked<R: Synced, D>(
        rows: &[R],
        listing: Listing<D>,
        report: &mut PhaseReport,
    ) -> Vec<Remote<D>> {
        let linked: HashSet<&str> = rows.iter().filter_map(|row| row.remote_id()).collect();

        for (key, e) in listing.malformed {
            if !linked.contains(key.as_str()) {
                report.skip(key, SkipReason::Malformed(e.to_string()));
            }
        }

        listing
            .docs
            .into_iter()
            .filter(|remote| !linked.contains(remote.key.as_str()))
            .collect()
    }

    /// Creates the catalog row for `item_name` if it is missing.
    async fn ensure_catalog_item(
        &self,
        item_name: &str,
        report: &mut PhaseReport,
    ) -> Result<(), SyncError> {
        if self.local.single_items.get_by_name(item_name).await?.is_none() {
            self.local
                .single_items
                .insert(&SingleItem::new(item_name))
                .await?;
            report.catalog_created += 1;
            debug!(item = item_name, "created catalog item");
        }
        Ok(())
    }

    // ========== Phases ==========

    async fn sync_stores(&self, report: &mut PhaseReport) -> Result<(), SyncError> {
        let path = CollectionPath::root(Collection::Stores);
        let owner = self.remote.owner_id();

        let stores = self.local.stores.list().await?;
        self.push_rows(Table::Stores, &path, &stores, report, |store| {
            convert::store_to_doc(store, owner)
        })
        .await?;

        let stores = self.local.stores.list().await?;
        let listing = self.remote.list(&path).await?;
        for remote in Self::unlinked(&stores, listing, report) {
            let store = match convert::store_from_doc(&remote) {
                Ok(store) => store,
                Err(e) => {
                    report.skip(remote.key, SkipReason::Malformed(e.to_string()));
                    continue;
                }
            };
            self.local.stores.insert(&store).await?;
            report.pulled += 1;
        }
        Ok(())
    }

    async fn sync_single_items(&self, report: &mut PhaseReport) -> Result<(), SyncError> {
        let path = CollectionPath::root(Collection::SingleItems);
        let owner = self.remote.owner_id();

        let items = self.local.single_items.list().await?;
        self.push_rows(Table::SingleItems, &path, &items, report, |item| {
            convert::single_item_to_doc(item, owner)
        })
        .await?;

        let items = self.local.single_items.list().await?;
        let listing = self.remote.list(&path).await?;
        for remote in Self::unlinked(&items, listing, report) {
            let item = match convert::single_item_from_doc(&remote) {
                Ok(item) => item,
                Err(e) => {
                    report.skip(remote.key, SkipReason::Malformed(e.to_string()));
                    continue;
                }
            };
            if self
                .local
                .single_items
                .get_by_name(&item.item_name)
                .await?
                .is_some()
            {
                report.skip(remote.key, SkipReason::DuplicateNaturalKey(item.item_name));
                continue;
            }
            self.local.single_items.insert(&item).await?;
            report.pulled += 1;
        }
        Ok(())
    }

    async fn sync_index_weights(&self, report: &mut PhaseReport) -> Result<(), SyncError> {
        let path = CollectionPath::root(Collection::IndexWeights);
        let owner = self.remote.owner_id();

        let store_keys: HashMap<LocalId, String> = self
            .local
            .stores
            .list()
            .await?
            .into_iter()
            .filter_map(|store| store.remote_id.map(|key| (store.id, key)))
            .collect();

        let (pushable, orphaned): (Vec<_>, Vec<_>) = self
            .local
            .index_weights
            .list()
            .await?
            .into_iter()
            .partition(|weight| store_keys.contains_key(&weight.store_id));
        for weight in orphaned {
            report.skip(
                format!("index weight {}", weight.id),
                SkipReason::MissingParent {
                    parent: "store",
                    key: weight.store_id.to_string(),
                },
            );
        }

        self.push_rows(Table::IndexWeights, &path, &pushable, report, |weight| {
            let store_key = store_keys
                .get(&weight.store_id)
                .ok_or(ConvertError::UnresolvedParent("store"))?;
            convert::index_weight_to_doc(weight, owner, store_key)
        })
        .await?;

        let weights = self.local.index_weights.list().await?;
        let listing = self.remote.list::<IndexWeightDoc>(&path).await?;
        for remote in Self::unlinked(&weights, listing, report) {
            let Some(store) = self
                .local
                .stores
                .get_by_remote_id(&remote.doc.store_key)
                .await?
            else {
                report.skip(
                    remote.key,
                    SkipReason::MissingParent {
                        parent: "store",
                        key: remote.doc.store_key,
                    },
                );
                continue;
            };

            let mut weight = match convert::index_weight_from_doc(&remote) {
                Ok(weight) => weight,
                Err(e) => {
                    report.skip(remote.key, SkipReason::Malformed(e.to_string()));
                    continue;
                }
            };
            weight.store_id = store.id;

            if self
                .local
                .index_weights
                .get_by_natural_key(&weight.item_name, store.id)
                .await?
                .is_some()
            {
                report.skip(
                    remote.key,
                    SkipReason::DuplicateNaturalKey(format!("{}@{}", weight.item_name, store.name)),
                );
                continue;
            }

            self.ensure_catalog_item(&weight.item_name, report).await?;
            self.local.index_weights.insert(&weight).await?;
            report.pulled += 1;
        }
        Ok(())
    }

    async fn sync_recipes(&self, report: &mut PhaseReport) -> Result<(), SyncError> {
        let path = CollectionPath::root(Collection::Recipes);
        let owner = self.remote.owner_id();

        let recipes = self.local.recipes.list().await?;
        self.push_rows(Table::Recipes, &path, &recipes, report, |recipe| {
            convert::recipe_to_doc(recipe, owner)
        })
        .await?;

        let recipes = self.local.recipes.list().await?;
        let listing = self.remote.list(&path).await?;
        for remote in Self::unlinked(&recipes, listing, report) {
            let recipe = match convert::recipe_from_doc(&remote) {
                Ok(recipe) => recipe,
                Err(e) => {
                    report.skip(remote.key, SkipReason::Malformed(e.to_string()));
                    continue;
                }
            };
            if self.local.recipes.get_by_name(&recipe.name).await?.is_some() {
                report.skip(remote.key, SkipReason::DuplicateNaturalKey(recipe.name));
                continue;
            }
            self.local.recipes.insert(&recipe).await?;
            report.pulled += 1;
        }
        Ok(())
    }

    async fn sync_recipe_items(&self, report: &mut PhaseReport) -> Result<(), SyncError> {
        let owner = self.remote.owner_id();

        let mut linked = Vec::new();
        for recipe in self.local.recipes.list().await? {
            match recipe.remote_id.clone() {
                Some(key) => linked.push((recipe, key)),
                None => report.skip(
                    format!("recipe '{}'", recipe.name),
                    SkipReason::MissingParent {
                        parent: "recipe",
                        key: recipe.id.to_string(),
                    },
                ),
            }
        }

        for (recipe, key) in &linked {
            let path = CollectionPath::recipe_items(key.as_str());
            let items = self.local.recipes.items(recipe.id).await?;
            self.push_rows(Table::RecipeItems, &path, &items, report, |item| {
                convert::recipe_item_to_doc(item, owner)
            })
            .await?;
        }

        for (recipe, key) in &linked {
            let path = CollectionPath::recipe_items(key.as_str());
            let items = self.local.recipes.items(recipe.id).await?;
            let listing = self.remote.list(&path).await?;
            for remote in Self::unlinked(&items, listing, report) {
                let mut item = match convert::recipe_item_from_doc(&remote) {
                    Ok(item) => item,
                    Err(e) => {
                        report.skip(remote.key, SkipReason::Malformed(e.to_string()));
                        continue;
                    }
                };
                item.recipe_id = recipe.id;

                if self
                    .local
                    .recipes
                    .get_item_by_name(recipe.id, &item.item_name)
                    .await?
                    .is_some()
                {
                    report.skip(remote.key, SkipReason::DuplicateNaturalKey(item.item_name));
                    continue;
                }

                self.ensure_catalog_item(&item.item_name, report).await?;
                self.local.recipes.insert_item(&item).await?;
                report.pulled += 1;
            }
        }
        Ok(())
    }

    // ========== Shopping list ==========

    async fn sync_shopping_list(&self, report: &mut PhaseReport) -> Result<(), SyncError> {
        let path = CollectionPath::root(Collection::ShoppingLists);
        let owner = self.remote.owner_id();

        let listing = self.remote.list(&path).await?;
        let remote_count = listing.docs.len() + listing.malformed.len();
        if remote_count > 1 {
            return Err(SyncError::SingletonViolation {
                side: Side::Remote,
                count: remote_count,
            });
        }
        if let Some((_, e)) = listing.malformed.into_iter().next() {
            return Err(e.into());
        }

        let local_lists = self.local.shopping_lists.list_all().await?;
        if local_lists.len() > 1 {
            return Err(SyncError::SingletonViolation {
                side: Side::Local,
                count: local_lists.len(),
            });
        }

        let remote_list = listing.docs.into_iter().next();
        let local_list = local_lists.into_iter().next();

        let (list, list_key) = match (remote_list, local_list) {
            (None, None) => {
                debug!("no shopping list on either side");
                return Ok(());
            }
            (None, Some(list)) => {
                // A linked list whose document is gone is recreated under
                // the same key.
                let doc = convert::shopping_list_to_doc(&list, owner)?;
                let key = self
                    .remote
                    .put(&path, list.remote_id.as_deref(), &doc)
                    .await?;
                if list.remote_id.is_none() {
                    self.local
                        .set_remote_id(Table::ShoppingLists, list.id, &key)
                        .await?;
                }
                report.created += 1;

                let items = self.local.shopping_lists.items(list.id).await?;
                report.rewritten += self
                    .push_list_items(&CollectionPath::list_items(key.as_str()), &items)
                    .await?;
                return Ok(());
            }
            (Some(remote), None) => {
                let mut list = convert::shopping_list_from_doc(&remote)?;
                list.id = self.local.shopping_lists.insert(&list).await?;
                report.pulled += 1;
                (list, remote.key)
            }
            (Some(remote), Some(mut list)) => {
                if list.remote_id.as_deref() != Some(remote.key.as_str()) {
                    self.local
                        .set_remote_id(Table::ShoppingLists, list.id, &remote.key)
                        .await?;
                    list.remote_id = Some(remote.key.clone());
                    report.adopted += 1;
                }
                (list, remote.key)
            }
        };

        self.merge_list_items(&list, &list_key, report).await
    }

    async fn merge_list_items(
        &self,
        list: &ShoppingList,
        list_key: &str,
        report: &mut PhaseReport,
    ) -> Result<(), SyncError> {
        let path = CollectionPath::list_items(list_key);

        let local_items = self.local.shopping_lists.items(list.id).await?;
        let listing = self.remote.list::<ListItemDoc>(&path).await?;
        for (key, e) in listing.malformed {
            report.skip(key, SkipReason::Malformed(e.to_string()));
        }

        let mut remote_items = Vec::with_capacity(listing.docs.len());
        for remote in &listing.docs {
            match convert::list_item_from_doc(remote) {
                Ok(mut item) => {
                    item.list_id = list.id;
                    remote_items.push(item);
                }
                Err(e) => report.skip(remote.key.clone(), SkipReason::Malformed(e.to_string())),
            }
        }

        let merged = merge_items(&local_items, remote_items);
        let local_by_name: HashMap<&str, &ShoppingListItem> = local_items
            .iter()
            .map(|item| (item.item_name.as_str(), item))
            .collect();

        for item in &local_items {
            if !merged.contains_key(&item.item_name) {
                self.local.shopping_lists.delete_item(item.id).await?;
                report.deleted_local += 1;
            }
        }

        for (name, item) in &merged {
            match local_by_name.get(name.as_str()) {
                None => {
                    self.ensure_catalog_item(name, report).await?;
                    self.local.shopping_lists.insert_item(item).await?;
                    report.merged_inserted += 1;
                }
                Some(local) => {
                    if local.checked_off != item.checked_off || local.remote_id != item.remote_id {
                        self.local.shopping_lists.update_item(item).await?;
                        report.merged_updated += 1;
                    }
                }
            }
        }

        // Terminal write: the remote items become an exact copy of the
        // merged local state.
        let removed = self.remote.delete_all(&path).await?;
        // Keys of deleted documents must not outlive them if a push below fails.
        self.local.shopping_lists.clear_item_remote_ids(list.id).await?;
        let final_items = self.local.shopping_lists.items(list.id).await?;
        report.rewritten += self.push_list_items(&path, &final_items).await?;
        debug!(removed, rewritten = report.rewritten, "rewrote remote list items");
        Ok(())
    }

    /// Pushes each item as a new remote document and links it.
    async fn push_list_items(
        &self,
        path: &CollectionPath,
        items: &[ShoppingListItem],
    ) -> Result<usize, SyncError> {
        let owner = self.remote.owner_id();
        for item in items {
            let doc = convert::list_item_to_doc(item, owner)?;
            let key = self.remote.put(path, None, &doc).await?;
            self.local
                .set_remote_id(Table::ShoppingListItems, item.id, &key)
                .await?;
        }
        Ok(items.len())
    }

    // ========== Deletion ==========

    /// Deletes a row locally and its document remotely, remote first.
    ///
    /// Returns `false` when the row does not exist locally.
    pub async fn remove(&self, removal: Removal) -> Result<bool, SyncError> {
        match removal {
            Removal::Store(id) => {
                let Some(store) = self.local.stores.get_by_id(id).await? else {
                    return Ok(false);
                };
                if let Some(key) = &store.remote_id {
                    let weights_path = CollectionPath::root(Collection::IndexWeights);
                    let weights = self.remote.list::<IndexWeightDoc>(&weights_path).await?;
                    for weight in weights.docs.iter().filter(|w| &w.doc.store_key == key) {
                        self.remote.delete(&weights_path, &weight.key).await?;
                    }
                    self.remote
                        .delete(&CollectionPath::root(Collection::Stores), key)
                        .await?;
                }
                self.local.stores.delete(id).await?;
            }
            Removal::SingleItem(id) => {
                let Some(item) = self.local.single_items.get_by_id(id).await? else {
                    return Ok(false);
                };
                if let Some(key) = &item.remote_id {
                    self.remote
                        .delete(&CollectionPath::root(Collection::SingleItems), key)
                        .await?;
                }
                self.local.single_items.delete(id).await?;
            }
            Removal::IndexWeight(id) => {
                let Some(weight) = self.local.index_weights.get_by_id(id).await? else {
                    return Ok(false);
                };
                if let Some(key) = &weight.remote_id {
                    self.remote
                        .delete(&CollectionPath::root(Collection::IndexWeights), key)
                        .await?;
                }
                self.local.index_weights.delete(id).await?;
            }
            Removal::Recipe(id) => {
                let Some(recipe) = self.local.recipes.get_by_id(id).await? else {
                    return Ok(false);
                };
                if let Some(key) = &recipe.remote_id {
                    self.remote
                        .delete_all(&CollectionPath::recipe_items(key.as_str()))
                        .await?;
                    self.remote
                        .delete(&CollectionPath::root(Collection::Recipes), key)
                        .await?;
                }
                self.local.recipes.delete(id).await?;
            }
            Removal::RecipeItem(id) => {
                let Some(item) = self.local.recipes.get_item(id).await? else {
                    return Ok(false);
                };
                let recipe = self.local.recipes.get_by_id(item.recipe_id).await?;
                if let (Some(key), Some(recipe_key)) =
                    (&item.remote_id, recipe.and_then(|r| r.remote_id))
                {
                    self.remote
                        .delete(&CollectionPath::recipe_items(recipe_key), key)
                        .await?;
                }
                self.local.recipes.delete_item(id).await?;
            }
            Removal::ShoppingListItem(id) => {
                let Some(item) = self.local.shopping_lists.get_item(id).await? else {
                    return Ok(false);
                };
                let list = self.local.shopping_lists.get_by_id(item.list_id).await?;
                if let (Some(key), Some(list_key)) =
                    (&item.remote_id, list.and_then(|l| l.remote_id))
                {
                    self.remote
                        .delete(&CollectionPath::list_items(list_key), key)
                        .await?;
                }
                self.local.shopping_lists.delete_item(id).await?;
            }
        }
        debug!(?removal, "removed");
        Ok(true)
    }
}

/// Key-union of local and remote items by name.
///
/// An item on both sides keeps its local identity and position but takes the
/// remote `checked_off` and remote key. Remote-only items keep their remote
/// shape and have no local id yet.
pub fn merge_items(
    local: &[ShoppingListItem],
    remote: Vec<ShoppingListItem>,
) -> BTreeMap<String, ShoppingListItem> {
    let mut merged: BTreeMap<String, ShoppingListItem> = local
        .iter()
        .map(|item| (item.item_name.clone(), item.clone()))
        .collect();

    for item in remote {
        match merged.get_mut(&item.item_name) {
            Some(existing) => {
                existing.checked_off = item.checked_off;
                existing.remote_id = item.remote_id;
            }
            None => {
                merged.insert(item.item_name.clone(), item);
            }
        }
    }
    merged
}
