use sqlx::SqlitePool;

use crate::models::{normalize_item_name, IndexWeight, LocalId};

const COLUMNS: &str = "id, remote_id, item_name, store_id, weight, created_at";

#[derive(Clone)]
pub struct IndexWeightRepository {
    pool: SqlitePool,
}

impl IndexWeightRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<IndexWeight>, sqlx::Error> {
        let sql = format!("SELECT {} FROM index_weights ORDER BY id", COLUMNS);
        sqlx::query_as(&sql).fetch_all(&self.pool).await
    }

    pub async fn list_for_store(&self, store_id: LocalId) -> Result<Vec<IndexWeight>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM index_weights WHERE store_id = ? ORDER BY weight DESC, item_name",
            COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: LocalId) -> Result<Option<IndexWeight>, sqlx::Error> {
        let sql = format!("SELECT {} FROM index_weights WHERE id = ?", COLUMNS);
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<IndexWeight>, sqlx::Error> {
        let sql = format!("SELECT {} FROM index_weights WHERE remote_id = ?", COLUMNS);
        sqlx::query_as(&sql)
            .bind(remote_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Looks a weight up by its natural key `(item_name, store_id)`.
    pub async fn get_by_natural_key(
        &self,
        item_name: &str,
        store_id: LocalId,
    ) -> Result<Option<IndexWeight>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM index_weights WHERE item_name = ? AND store_id = ?",
            COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(normalize_item_name(item_name))
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(&self, weight: &IndexWeight) -> Result<LocalId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO index_weights (remote_id, item_name, store_id, weight, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&weight.remote_id)
        .bind(normalize_item_name(&weight.item_name))
        .bind(weight.store_id)
        .bind(weight.weight)
        .bind(&weight.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, weight: &IndexWeight) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE index_weights SET remote_id = ?, weight = ? WHERE id = ?")
            .bind(&weight.remote_id)
            .bind(weight.weight)
            .bind(weight.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM index_weights WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
