use crate::access::require_owner;
use crate::category::category_dto::CategoryRequest;
use crate::category::category_models::{Category, CategoryWithCount};
use crate::category::category_repository::CategoryRepository;
use crate::error::{AppError, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct CategoryService {
    repo: CategoryRepository,
}

impl CategoryService {
    pub fn new(repo: CategoryRepository) -> Self {
        Self { repo }
    }

    pub async fn list_categories(&self, user_id: Uuid) -> Result<Vec<CategoryWithCount>> {
        self.repo.find_all_with_counts(user_id).await
    }

    pub async fn get_category(&self, user_id: Uuid, category_id: Uuid) -> Result<Category> {
        let category = self.repo.find_by_id(category_id).await?;
        require_owner(category, user_id, "Category")
    }

    pub async fn create_category(&self, user_id: Uuid, payload: CategoryRequest) -> Result<Category> {
        self.repo
            .create(user_id, &payload.name, payload.description.as_deref())
            .await
            .map_err(duplicate_name)
    }

    pub async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        payload: CategoryRequest,
    ) -> Result<Category> {
        self.get_category(user_id, category_id).await?;

        self.repo
            .update(category_id, &payload.name, payload.description.as_deref())
            .await
            .map_err(duplicate_name)
    }

    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> Result<()> {
        self.get_category(user_id, category_id).await?;
        self.repo.delete(category_id).await?;
        Ok(())
    }
}

fn duplicate_name(err: AppError) -> AppError {
    if err.is_unique_violation() {
        AppError::BadRequest("You already have a category with this name".to_string())
    } else {
        err
    }
}
