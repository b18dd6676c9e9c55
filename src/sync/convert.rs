//! Entity converter: local rows to remote documents and back.
//!
//! Pure functions only. Documents never carry local surrogate keys; parent
//! references travel as remote keys, passed in by the caller on push. Rows
//! rebuilt from documents have their parent keys set to [`UNRESOLVED`] and
//! the reconciler resolves them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{
    normalize_item_name, IndexWeight, Recipe, RecipeItem, ShoppingList, ShoppingListItem,
    SingleItem, Store, UNRESOLVED,
};
use crate::sync::error::ConvertError;
use crate::sync::remote::{Document, Fields};

/// The remote store's native timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

/// Encodes a local RFC 3339 timestamp for the remote store.
pub fn encode_timestamp(local: &str) -> Result<RemoteTimestamp, ConvertError> {
    let parsed = DateTime::parse_from_rfc3339(local).map_err(|e| {
        ConvertError::InvalidTimestamp {
            value: local.to_string(),
            reason: e.to_string(),
        }
    })?;
    let utc = parsed.with_timezone(&Utc);
    Ok(RemoteTimestamp {
        seconds: utc.timestamp(),
        nanos: utc.timestamp_subsec_nanos(),
    })
}

/// Decodes a remote timestamp into the local string form.
pub fn decode_timestamp(ts: RemoteTimestamp) -> Result<String, ConvertError> {
    let utc = DateTime::<Utc>::from_timestamp(ts.seconds, ts.nanos).ok_or(
        ConvertError::TimestampOutOfRange {
            seconds: ts.seconds,
            nanos: ts.nanos,
        },
    )?;
    Ok(utc.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A typed remote document.
pub trait RemoteDoc: Serialize + DeserializeOwned + Send + Sync {
    fn owner_id(&self) -> &str;

    /// Domain key used to find a pre-existing document before creating one.
    /// `None` for entities identified only by their surrogate key, which are
    /// never adopted.
    fn natural_key(&self) -> Option<String>;
}

/// A decoded document together with its remote key.
#[derive(Debug, Clone, PartialEq)]
pub struct Remote<D> {
    pub key: String,
    pub doc: D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDoc {
    pub owner_id: String,
    pub name: String,
    pub created_at: RemoteTimestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListDoc {
    pub owner_id: String,
    pub name: String,
    pub created_at: RemoteTimestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleItemDoc {
    pub owner_id: String,
    pub item_name: String,
    pub created_at: RemoteTimestamp,
}

/// Item in `ShoppingLists/{key}/Items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemDoc {
    pub owner_id: String,
    pub item_name: String,
    pub checked_off: bool,
    #[serde(default)]
    pub position: i64,
    pub created_at: RemoteTimestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexWeightDoc {
    pub owner_id: String,
    pub item_name: String,
    /// Remote key of the store this weight belongs to.
    pub store_key: String,
    pub weight: i64,
    pub created_at: RemoteTimestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDoc {
    pub owner_id: String,
    pub name: String,
    pub created_at: RemoteTimestamp,
}

/// Item in `Recipes/{key}/Items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeItemDoc {
    pub owner_id: String,
    pub item_name: String,
    pub created_at: RemoteTimestamp,
}

macro_rules! remote_doc {
    ($ty:ty, |$doc:ident| $key:expr) => {
        impl RemoteDoc for $ty {
            fn owner_id(&self) -> &str {
                &self.owner_id
            }

            fn natural_key(&self) -> Option<String> {
                let $doc = self;
                Some($key)
            }
        }
    };
}

// Same-named stores on two devices are different stores.
impl RemoteDoc for StoreDoc {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn natural_key(&self) -> Option<String> {
        None
    }
}


remote_doc!(ShoppingListDoc, |d| d.name.clone());
remote_doc!(SingleItemDoc, |d| normalize_item_name(&d.item_name));
remote_doc!(ListItemDoc, |d| normalize_item_name(&d.item_name));
remote_doc!(IndexWeightDoc, |d| format!(
    "{}@{}",
    normalize_item_name(&d.item_name),
    d.store_key
));
remote_doc!(RecipeDoc, |d| d.name.clone());
remote_doc!(RecipeItemDoc, |d| normalize_item_name(&d.item_name));

/// Serializes a document into a field map.
pub fn to_fields<D: Serialize>(doc: &D) -> Result<Fields, ConvertError> {
    match serde_json::to_value(doc) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        _ => Err(ConvertError::NotAnObject),
    }
}

/// Decodes a raw document into its typed form.
pub fn from_document<D: DeserializeOwned>(document: Document) -> Result<Remote<D>, ConvertError> {
    let doc = serde_json::from_value(serde_json::Value::Object(document.fields)).map_err(|e| {
        ConvertError::Malformed {
            key: document.key.clone(),
            reason: e.to_string(),
        }
    })?;
    Ok(Remote {
        key: document.key,
        doc,
    })
}

// ========== Stores ==========

pub fn store_to_doc(store: &Store, owner_id: &str) -> Result<StoreDoc, ConvertError> {
    Ok(StoreDoc {
        owner_id: owner_id.to_string(),
        name: store.name.clone(),
        created_at: encode_timestamp(&store.created_at)?,
    })
}

pub fn store_from_doc(remote: &Remote<StoreDoc>) -> Result<Store, ConvertError> {
    Ok(Store {
        id: 0,
        remote_id: Some(remote.key.clone()),
        name: remote.doc.name.clone(),
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}

// ========== Shopping list ==========

pub fn shopping_list_to_doc(
    list: &ShoppingList,
    owner_id: &str,
) -> Result<ShoppingListDoc, ConvertError> {
    Ok(ShoppingListDoc {
        owner_id: owner_id.to_string(),
        name: list.name.clone(),
        created_at: encode_timestamp(&list.created_at)?,
    })
}

pub fn shopping_list_from_doc(
    remote: &Remote<ShoppingListDoc>,
) -> Result<ShoppingList, ConvertError> {
    Ok(ShoppingList {
        id: 0,
        remote_id: Some(remote.key.clone()),
        name: remote.doc.name.clone(),
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}

pub fn list_item_to_doc(
    item: &ShoppingListItem,
    owner_id: &str,
) -> Result<ListItemDoc, ConvertError> {
    Ok(ListItemDoc {
        owner_id: owner_id.to_string(),
        item_name: item.item_name.clone(),
        checked_off: item.checked_off,
        position: item.position,
        created_at: encode_timestamp(&item.created_at)?,
    })
}

pub fn list_item_from_doc(remote: &Remote<ListItemDoc>) -> Result<ShoppingListItem, ConvertError> {
    Ok(ShoppingListItem {
        id: 0,
        remote_id: Some(remote.key.clone()),
        list_id: UNRESOLVED,
        item_name: normalize_item_name(&remote.doc.item_name),
        checked_off: remote.doc.checked_off,
        position: remote.doc.position,
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}

// ========== Catalog ==========

pub fn single_item_to_doc(item: &SingleItem, owner_id: &str) -> Result<SingleItemDoc, ConvertError> {
    Ok(SingleItemDoc {
        owner_id: owner_id.to_string(),
        item_name: item.item_name.clone(),
        created_at: encode_timestamp(&item.created_at)?,
    })
}

pub fn single_item_from_doc(remote: &Remote<SingleItemDoc>) -> Result<SingleItem, ConvertError> {
    Ok(SingleItem {
        id: 0,
        remote_id: Some(remote.key.clone()),
        item_name: normalize_item_name(&remote.doc.item_name),
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}

// ========== Index weights ==========

pub fn index_weight_to_doc(
    weight: &IndexWeight,
    owner_id: &str,
    store_key: &str,
) -> Result<IndexWeightDoc, ConvertError> {
    Ok(IndexWeightDoc {
        owner_id: owner_id.to_string(),
        item_name: weight.item_name.clone(),
        store_key: store_key.to_string(),
        weight: weight.weight,
        created_at: encode_timestamp(&weight.created_at)?,
    })
}

pub fn index_weight_from_doc(remote: &Remote<IndexWeightDoc>) -> Result<IndexWeight, ConvertError> {
    Ok(IndexWeight {
        id: 0,
        remote_id: Some(remote.key.clone()),
        item_name: normalize_item_name(&remote.doc.item_name),
        store_id: UNRESOLVED,
        weight: remote.doc.weight,
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}

// ========== Recipes ==========

pub fn recipe_to_doc(recipe: &Recipe, owner_id: &str) -> Result<RecipeDoc, ConvertError> {
    Ok(RecipeDoc {
        owner_id: owner_id.to_string(),
        name: recipe.name.clone(),
        created_at: encode_timestamp(&recipe.created_at)?,
    })
}

pub fn recipe_from_doc(remote: &Remote<RecipeDoc>) -> Result<Recipe, ConvertError> {
    Ok(Recipe {
        id: 0,
        remote_id: Some(remote.key.clone()),
        name: remote.doc.name.clone(),
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}

pub fn recipe_item_to_doc(item: &RecipeItem, owner_id: &str) -> Result<RecipeItemDoc, ConvertError> {
    Ok(RecipeItemDoc {
        owner_id: owner_id.to_string(),
        item_name: item.item_name.clone(),
        created_at: encode_timestamp(&item.created_at)?,
    })
}

pub fn recipe_item_from_doc(remote: &Remote<RecipeItemDoc>) -> Result<RecipeItem, ConvertError> {
    Ok(RecipeItem {
        id: 0,
        remote_id: Some(remote.key.clone()),
        recipe_id: UNRESOLVED,
        item_name: normalize_item_name(&remote.doc.item_name),
        created_at: decode_timestamp(remote.doc.created_at)?,
    })
}
