use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::category_models::{Category, CategoryWithCount};

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all_with_counts(&self, user_id: Uuid) -> Result<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            "SELECT c.id, c.user_id, c.name, c.description, COUNT(t.id) AS task_count
             FROM categories c
             LEFT JOIN tasks t ON t.category_id = c.id AND t.user_id = c.user_id
             WHERE c.user_id = $1
             GROUP BY c.id
             ORDER BY c.name"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Looks a category up regardless of owner; callers check ownership.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = $1 AND user_id = $2"
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (user_id, name, description)
             VALUES ($1, $2, $3)
             RETURNING *"
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $1, description = $2
             WHERE id = $3
             RETURNING *"
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Tasks in the category keep existing with `category_id` set to NULL
    /// (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task_repository::tests::{insert_task, insert_user};
    use crate::task::task_repository::TaskRepository;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_deleting_category_keeps_its_tasks(pool: PgPool) {
        let user_id = insert_user(&pool, "alice").await;
        let repo = CategoryRepository::new(pool.clone());
        let category = repo.create(user_id, "Work", None).await.unwrap();
        let task = insert_task(&pool, user_id, "Write report", Some(category.id), None).await;

        assert_eq!(repo.delete(category.id).await.unwrap(), 1);

        let stored = TaskRepository::new(pool.clone())
            .find_by_id(task.id)
            .await
            .unwrap()
            .expect("task survives category deletion");
        assert_eq!(stored.category_id, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_names_are_unique_per_owner(pool: PgPool) {
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let repo = CategoryRepository::new(pool.clone());

        repo.create(alice, "Work", None).await.unwrap();
        let duplicate = repo.create(alice, "Work", None).await.unwrap_err();
        assert!(duplicate.is_unique_violation());
        assert!(repo.create(bob, "Work", None).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_counts_and_ownership(pool: PgPool) {
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let repo = CategoryRepository::new(pool.clone());
        let home = repo.create(alice, "Home", None).await.unwrap();
        let work = repo.create(alice, "Work", None).await.unwrap();
        insert_task(&pool, alice, "Laundry", Some(home.id), None).await;
        insert_task(&pool, alice, "Dishes", Some(home.id), None).await;

        let counts = repo.find_all_with_counts(alice).await.unwrap();
        let summary: Vec<(&str, i64)> = counts.iter().map(|c| (c.name.as_str(), c.task_count)).collect();
        assert_eq!(summary, vec![("Home", 2), ("Work", 0)]);

        assert!(repo.find_owned(work.id, alice).await.unwrap().is_some());
        assert!(repo.find_owned(work.id, bob).await.unwrap().is_none());
    }
}
