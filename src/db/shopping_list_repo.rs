use sqlx::SqlitePool;

use crate::models::{normalize_item_name, LocalId, ShoppingList, ShoppingListItem};

const ITEM_COLUMNS: &str = "id, remote_id, list_id, item_name, checked_off, position, created_at";

/// Shopping list singleton and its items.
#[derive(Clone)]
pub struct ShoppingListRepository {
    pool: SqlitePool,
}

impl ShoppingListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========== Lists ==========

    /// All lists. More than one row means the singleton was violated.
    pub async fn list_all(&self) -> Result<Vec<ShoppingList>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM shopping_lists ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: LocalId) -> Result<Option<ShoppingList>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM shopping_lists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<ShoppingList>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, name, created_at FROM shopping_lists WHERE remote_id = ?",
        )
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert(&self, list: &ShoppingList) -> Result<LocalId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO shopping_lists (remote_id, name, created_at) VALUES (?, ?, ?)",
        )
        .bind(&list.remote_id)
        .bind(&list.name)
        .bind(&list.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, list: &ShoppingList) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE shopping_lists SET remote_id = ?, name = ? WHERE id = ?")
            .bind(&list.remote_id)
            .bind(&list.name)
            .bind(list.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM shopping_lists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========== Items ==========

    pub async fn items(&self, list_id: LocalId) -> Result<Vec<ShoppingListItem>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM shopping_list_items WHERE list_id = ? ORDER BY position, id",
            ITEM_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_item(&self, id: LocalId) -> Result<Option<ShoppingListItem>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM shopping_list_items WHERE id = ?",
            ITEM_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Looks an item up by its natural key `(list_id, item_name)`.
    pub async fn get_item_by_name(
        &self,
        list_id: LocalId,
        item_name: &str,
    ) -> Result<Option<ShoppingListItem>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM shopping_list_items WHERE list_id = ? AND item_name = ?",
            ITEM_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(list_id)
            .bind(normalize_item_name(item_name))
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts an item. The catalog row for its name must already exist.
    pub async fn insert_item(&self, item: &ShoppingListItem) -> Result<LocalId, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO shopping_list_items (remote_id, list_id, item_name, checked_off, position, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.remote_id)
        .bind(item.list_id)
        .bind(normalize_item_name(&item.item_name))
        .bind(item.checked_off)
        .bind(item.position)
        .bind(&item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_item(&self, item: &ShoppingListItem) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE shopping_list_items SET remote_id = ?, checked_off = ?, position = ? WHERE id = ?",
        )
        .bind(&item.remote_id)
        .bind(item.checked_off)
        .bind(item.position)
        .bind(item.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Unlinks every item of a list from its remote document.
    pub async fn clear_item_remote_ids(&self, list_id: LocalId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE shopping_list_items SET remote_id = NULL WHERE list_id = ?")
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_item(&self, id: LocalId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM shopping_list_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
