//! Local row types for the grocery list store.
//!
//! Every row carries a surrogate key assigned by SQLite on insert and an
//! optional remote key assigned by the cloud document store on first push.
//! Child rows point at parents by surrogate key only.

mod index_weight;
mod recipe;
mod shopping_list;
mod single_item;
mod store;

pub use index_weight::IndexWeight;
pub use recipe::{Recipe, RecipeItem};
pub use shopping_list::{ShoppingList, ShoppingListItem};
pub use single_item::{normalize_item_name, SingleItem};
pub use store::Store;

use chrono::{SecondsFormat, Utc};

/// Surrogate key assigned by the local store.
pub type LocalId = i64;

/// Parent key of a row rebuilt from a remote document before the
/// reconciler has resolved it to a local row.
pub const UNRESOLVED: LocalId = 0;

/// Rows that can be paired with a remote document.
pub trait Synced {
    fn local_id(&self) -> LocalId;
    fn remote_id(&self) -> Option<&str>;
}

macro_rules! impl_synced {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Synced for $ty {
                fn local_id(&self) -> LocalId {
                    self.id
                }

                fn remote_id(&self) -> Option<&str> {
                    self.remote_id.as_deref()
                }
            }
        )*
    };
}

impl_synced!(
    Store,
    ShoppingList,
    ShoppingListItem,
    SingleItem,
    IndexWeight,
    Recipe,
    RecipeItem,
);

/// Current time in the local store's string form (RFC 3339, milliseconds, UTC).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
