use sqlx::SqlitePool;

use crate::models::{normalize_item_name, LocalId, SingleItem};

#[derive(Clone)]
pub struct SingleItemRepository {
    pool: SqlitePool,
}

impl SingleItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<SingleItem>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, item_name, created_at FROM single_items ORDER BY item_name",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_by_id(&self, id: LocalId) -> Result<Option<SingleItem>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, item_name, created_at FROM single_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<SingleItem>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, item_name, created_at FROM single_items WHERE remote_id = ?",
        )
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Looks an item up by its natural key. The name is normalized first.
    pub async fn get_by_name(&self, item_name: &str) -> Result<Option<SingleItem>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, item_name, created_at FROM single_items WHERE item_name = ?",
        )
        .bind(normalize_item_name(item_name))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert(&self, item: &SingleItem) -> Result<LocalId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO single_items (remote_id, item_name, created_at) VALUES (?, ?, ?)",
        )
        .bind(&item.remote_id)
        .bind(normalize_item_name(&item.item_name))
        .bind(&item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, item: &SingleItem) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE single_items SET remote_id = ?, item_name = ? WHERE id = ?")
            .bind(&item.remote_id)
            .bind(normalize_item_name(&item.item_name))
            .bind(item.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM single_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
