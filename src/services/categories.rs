use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{category, product, Category, CategoryModel, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Category directory: listing, per-category product lookup, and the
/// label-rename path with its collision rule.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a new category with a unique label.
    #[instrument(skip(self))]
    pub async fn create_category(&self, label: String) -> Result<CategoryModel, ServiceError> {
        self.ensure_unique_label(&label, None).await?;

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            label: Set(label),
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!("Created category: {}", category.id);
        Ok(category)
    }

    /// All categories, ordered by label.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Category::find()
            .order_by_asc(category::Column::Label)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Get a category by ID.
    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    /// Rename a category. Renaming to a label held by a *different* category
    /// is a conflict and leaves both labels untouched; renaming a category to
    /// its own label is a no-op that succeeds.
    #[instrument(skip(self))]
    pub async fn rename_category(
        &self,
        category_id: Uuid,
        new_label: String,
    ) -> Result<CategoryModel, ServiceError> {
        let category = self.get_category(category_id).await?;

        if category.label == new_label {
            return Ok(category);
        }

        self.ensure_unique_label(&new_label, Some(category_id)).await?;

        let mut active: category::ActiveModel = category.into();
        active.label = Set(new_label);
        let category = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryRenamed(category.id))
            .await;

        info!("Renamed category {} to {}", category.id, category.label);
        Ok(category)
    }

    /// Delete a category. Products keep existing with a nulled category
    /// reference (FK `ON DELETE SET NULL`).
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let category = self.get_category(category_id).await?;
        category.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!("Deleted category {}", category_id);
        Ok(())
    }

    /// Products belonging to the category with the given label (exact match).
    #[instrument(skip(self))]
    pub async fn list_products_in_category(
        &self,
        label: &str,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let category = Category::find()
            .filter(category::Column::Label.eq(label))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No category found with label {}", label))
            })?;

        category
            .find_related(crate::entities::Product)
            .order_by_asc(product::Column::Label)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    async fn ensure_unique_label(
        &self,
        label: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Category::find().filter(category::Column::Label.eq(label));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category {} already exists",
                label
            )));
        }

        Ok(())
    }
}
