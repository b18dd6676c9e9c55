//! Local store backed by SQLite.
//!
//! The local store is authoritative while offline. Each repository exposes
//! the per-entity accessors the reconciler relies on: list, lookup by
//! remote key, lookup by natural key, insert returning the new surrogate
//! key, update and delete.

mod index_weight_repo;
mod recipe_repo;
mod shopping_list_repo;
mod single_item_repo;
mod store_repo;

pub use index_weight_repo::IndexWeightRepository;
pub use recipe_repo::RecipeRepository;
pub use shopping_list_repo::ShoppingListRepository;
pub use single_item_repo::SingleItemRepository;
pub use store_repo::StoreRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::models::LocalId;

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Local tables that carry a remote key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Stores,
    ShoppingLists,
    ShoppingListItems,
    SingleItems,
    IndexWeights,
    Recipes,
    RecipeItems,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Stores => "stores",
            Table::ShoppingLists => "shopping_lists",
            Table::ShoppingListItems => "shopping_list_items",
            Table::SingleItems => "single_items",
            Table::IndexWeights => "index_weights",
            Table::Recipes => "recipes",
            Table::RecipeItems => "recipe_items",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// All local repositories over one pool.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
    pub stores: StoreRepository,
    pub shopping_lists: ShoppingListRepository,
    pub single_items: SingleItemRepository,
    pub index_weights: IndexWeightRepository,
    pub recipes: RecipeRepository,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            stores: StoreRepository::new(pool.clone()),
            shopping_lists: ShoppingListRepository::new(pool.clone()),
            single_items: SingleItemRepository::new(pool.clone()),
            index_weights: IndexWeightRepository::new(pool.clone()),
            recipes: RecipeRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Records the remote key for a row. Only the reconciler calls this.
    pub async fn set_remote_id(
        &self,
        table: Table,
        id: LocalId,
        remote_id: &str,
    ) -> Result<(), sqlx::Error> {
        let sql = format!("UPDATE {} SET remote_id = ? WHERE id = ?", table.name());
        sqlx::query(&sql)
            .bind(remote_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Row counts per table, in pipeline order.
    pub async fn counts(&self) -> Result<Vec<(Table, i64)>, sqlx::Error> {
        let mut counts = Vec::new();
        for table in [
            Table::Stores,
            Table::ShoppingLists,
            Table::ShoppingListItems,
            Table::SingleItems,
            Table::IndexWeights,
            Table::Recipes,
            Table::RecipeItems,
        ] {
            let sql = format!("SELECT COUNT(*) FROM {}", table.name());
            let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
            counts.push((table, count));
        }
        Ok(counts)
    }
}
