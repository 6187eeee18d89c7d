use crate::error::{AppError, AppResult};
use crate::models::{Category, EntryType};
use crate::repositories::CategoryRepository;
use crate::validation;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MAX_NAME: usize = 50;
const MAX_ICON: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub category_type: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub struct CategoryService {
    category_repo: Arc<CategoryRepository>,
}

impl CategoryService {
    pub fn new(category_repo: Arc<CategoryRepository>) -> Self {
        Self { category_repo }
    }

    pub async fn list(&self, user_id: Uuid, category_type: Option<&str>) -> AppResult<Vec<Category>> {
        let category_type = category_type
            .map(|t| EntryType::from_str(t).map_err(AppError::Validation))
            .transpose()?;

        Ok(self
            .category_repo
            .find_by_user(user_id, category_type.as_ref().map(EntryType::as_str))
            .await?)
    }

    pub async fn create(&self, user_id: Uuid, req: &CreateCategoryRequest) -> AppResult<Category> {
        let name = validation::sanitize_text(&req.name, MAX_NAME, "Name")?;
        let category_type = EntryType::from_str(&req.category_type).map_err(AppError::Validation)?;
        let color = req.color.as_deref().map(validation::colour).transpose()?;
        let icon = validation::optional_text(req.icon.as_deref(), MAX_ICON, "Icon")?;

        let category = self
            .category_repo
            .create(user_id, &name, category_type.as_str(), color.as_deref(), icon.as_deref())
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict("A category with this name already exists".to_string())
                }
                other => other,
            })?;

        info!("Created category {} for {}", category.id, user_id);
        Ok(category)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: &UpdateCategoryRequest,
    ) -> AppResult<Category> {
        let name = req
            .name
            .as_deref()
            .map(|n| validation::sanitize_text(n, MAX_NAME, "Name"))
            .transpose()?;
        let color = req.color.as_deref().map(validation::colour).transpose()?;
        let icon = validation::optional_text(req.icon.as_deref(), MAX_ICON, "Icon")?;

        self.category_repo
            .update(id, user_id, name.as_deref(), color.as_deref(), icon.as_deref())
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict("A category with this name already exists".to_string())
                }
                other => other,
            })?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.category_repo.delete(id, user_id).await? {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
        info!("Deleted category {} for {}", id, user_id);
        Ok(())
    }
}
