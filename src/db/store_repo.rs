use sqlx::SqlitePool;

use crate::models::{LocalId, Store};

#[derive(Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Store>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM stores ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: LocalId) -> Result<Option<Store>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM stores WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<Store>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM stores WHERE remote_id = ?")
            .bind(remote_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts a store and returns its new surrogate key.
    pub async fn insert(&self, store: &Store) -> Result<LocalId, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO stores (remote_id, name, created_at) VALUES (?, ?, ?)")
                .bind(&store.remote_id)
                .bind(&store.name)
                .bind(&store.created_at)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, store: &Store) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE stores SET remote_id = ?, name = ? WHERE id = ?")
            .bind(&store.remote_id)
            .bind(&store.name)
            .bind(store.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> Result<(), sqlx::Error> {
        // CASCADE removes the store's index weights
        sqlx::query("DELETE FROM stores WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
