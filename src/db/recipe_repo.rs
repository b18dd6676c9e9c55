use sqlx::SqlitePool;

use crate::models::{normalize_item_name, LocalId, Recipe, RecipeItem};

/// Recipes and their ingredient rows.
#[derive(Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Recipe>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM recipes ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: LocalId) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM recipes WHERE remote_id = ?")
            .bind(remote_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as("SELECT id, remote_id, name, created_at FROM recipes WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(&self, recipe: &Recipe) -> Result<LocalId, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO recipes (remote_id, name, created_at) VALUES (?, ?, ?)")
                .bind(&recipe.remote_id)
                .bind(&recipe.name)
                .bind(&recipe.created_at)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, recipe: &Recipe) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE recipes SET remote_id = ?, name = ? WHERE id = ?")
            .bind(&recipe.remote_id)
            .bind(&recipe.name)
            .bind(recipe.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> Result<(), sqlx::Error> {
        // CASCADE will handle recipe_items
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========== Items ==========

    pub async fn items(&self, recipe_id: LocalId) -> Result<Vec<RecipeItem>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, recipe_id, item_name, created_at FROM recipe_items WHERE recipe_id = ? ORDER BY item_name",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_item(&self, id: LocalId) -> Result<Option<RecipeItem>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, recipe_id, item_name, created_at FROM recipe_items WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_item_by_name(
        &self,
        recipe_id: LocalId,
        item_name: &str,
    ) -> Result<Option<RecipeItem>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, remote_id, recipe_id, item_name, created_at FROM recipe_items WHERE recipe_id = ? AND item_name = ?",
        )
        .bind(recipe_id)
        .bind(normalize_item_name(item_name))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_item(&self, item: &RecipeItem) -> Result<LocalId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO recipe_items (remote_id, recipe_id, item_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.remote_id)
        .bind(item.recipe_id)
        .bind(normalize_item_name(&item.item_name))
        .bind(&item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn delete_item(&self, id: LocalId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM recipe_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::setup_local;
    use crate::models::{Recipe, RecipeItem, SingleItem};

    #[tokio::test]
    async fn test_recipe_with_items() {
        let db = setup_local().await;
        let repo = &db.local.recipes;

        let recipe_id = repo.insert(&Recipe::new("Pancakes")).await.unwrap();
        for name in ["flour", "eggs"] {
            db.local
                .single_items
                .insert(&SingleItem::new(name))
                .await
                .unwrap();
            repo.insert_item(&RecipeItem::new(recipe_id, name))
                .await
                .unwrap();
        }

        let items = repo.items(recipe_id).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["eggs", "flour"]);

        let by_name = repo.get_by_name("Pancakes").await.unwrap().unwrap();
        assert_eq!(by_name.id, recipe_id);
    }

    #[tokio::test]
    async fn test_delete_recipe_cascades() {
        let db = setup_local().await;
        let repo = &db.local.recipes;

        let recipe_id = repo.insert(&Recipe::new("Toast")).await.unwrap();
        db.local
            .single_items
            .insert(&SingleItem::new("bread"))
            .await
            .unwrap();
        let item_id = repo
            .insert_item(&RecipeItem::new(recipe_id, "bread"))
            .await
            .unwrap();

        repo.delete(recipe_id).await.unwrap();

        assert!(repo.get_item(item_id).await.unwrap().is_none());
    }
}
