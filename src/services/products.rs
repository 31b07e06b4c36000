use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{category, product, promotion, Category, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Product service: CRUD plus the listing queries that feed the read API.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a new product.
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        ensure_valid_price(&input.price)?;

        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            label: Set(input.label),
            description: Set(input.description.unwrap_or_default()),
            price: Set(input.price),
            image_url: Set(input.image_url),
            category_id: Set(input.category_id),
            created_by: Set(input.created_by),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(product)
    }

    /// Get a product by ID.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Apply a typed partial update. Only the provided fields change; when
    /// an actor is given, the update stamps it as the product's creator.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if let Some(ref price) = input.price {
            ensure_valid_price(price)?;
        }
        if let Some(category_id) = input.category_id.flatten() {
            self.ensure_category_exists(category_id).await?;
        }

        let product = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = product.into();

        if let Some(label) = input.label {
            active.label = Set(label);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }

        // Stamp the acting administrator, but never erase the stored one
        if let Some(actor) = input.actor {
            active.created_by = Set(Some(actor));
        }
        active.updated_at = Set(Some(Utc::now()));

        let product = active.update(&*self.db).await?;
        info!("Updated product: {}", product_id);
        Ok(product)
    }

    /// Move a product into the category with the given label.
    #[instrument(skip(self))]
    pub async fn set_product_category(
        &self,
        product_id: Uuid,
        category_label: &str,
    ) -> Result<ProductModel, ServiceError> {
        let category = Category::find()
            .filter(category::Column::Label.eq(category_label))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No category found with label {}", category_label))
            })?;

        let product = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = product.into();
        active.category_id = Set(Some(category.id));
        active.updated_at = Set(Some(Utc::now()));

        let product = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!("Moved product {} into category {}", product_id, category_label);
        Ok(product)
    }

    /// Delete a product; its promotions cascade away with it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(product_id).await?;
        product.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Deleted product {}", product_id);
        Ok(())
    }

    /// Products (optionally restricted to one category) together with the
    /// context the pricing resolver needs: category label and promotions.
    #[instrument(skip(self))]
    pub async fn list_with_context(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<ProductWithContext>, ServiceError> {
        let mut query = Product::find().order_by_asc(product::Column::Label);
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let products = query.all(&*self.db).await?;
        self.attach_context(products).await
    }

    /// One page of products with pricing context, plus the unpaginated count.
    /// Pages are 1-based.
    #[instrument(skip(self))]
    pub async fn list_page_with_context(
        &self,
        category_id: Option<Uuid>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ProductWithContext>, u64), ServiceError> {
        let mut query = Product::find().order_by_asc(product::Column::Label);
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let count = query.clone().count(&*self.db).await?;

        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let products = query.limit(page_size).offset(offset).all(&*self.db).await?;

        let items = self.attach_context(products).await?;
        Ok((items, count))
    }

    /// All promotions stored for one product, past and future included.
    #[instrument(skip(self))]
    pub async fn promotions_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<promotion::Model>, ServiceError> {
        let product = self.get_product(product_id).await?;
        product
            .find_related(crate::entities::Promotion)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    async fn attach_context(
        &self,
        products: Vec<ProductModel>,
    ) -> Result<Vec<ProductWithContext>, ServiceError> {
        let categories = products.load_one(Category, &*self.db).await?;
        let promotions = products
            .load_many(crate::entities::Promotion, &*self.db)
            .await?;

        Ok(products
            .into_iter()
            .zip(categories)
            .zip(promotions)
            .map(|((product, category), promotions)| ProductWithContext {
                product,
                category_label: category.map(|c| c.label),
                promotions,
            })
            .collect())
    }

    async fn ensure_category_exists(&self, category_id: Uuid) -> Result<(), ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;
        Ok(())
    }
}

fn ensure_valid_price(price: &Decimal) -> Result<(), ServiceError> {
    if *price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "price must be greater than 0".to_string(),
        ));
    }
    // Trailing zeros are not significant: 100.990 still has 2 digits
    if price.normalize().scale() > 2 {
        return Err(ServiceError::ValidationError(
            "price cannot have more than 2 decimal places".to_string(),
        ));
    }
    Ok(())
}

/// Input for creating a product
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub label: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Input for a typed partial update. `category_id` distinguishes "leave as
/// is" (`None`) from "clear the category" (`Some(None)`).
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
    pub label: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
    pub actor: Option<Uuid>,
}

/// A product together with its category label and full promotion set.
#[derive(Debug, Clone)]
pub struct ProductWithContext {
    pub product: ProductModel,
    pub category_label: Option<String>,
    pub promotions: Vec<promotion::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_price_boundary() {
        assert!(ensure_valid_price(&dec!(0)).is_err());
        assert!(ensure_valid_price(&dec!(-1)).is_err());
        assert!(ensure_valid_price(&dec!(0.01)).is_ok());
    }

    #[test]
    fn price_is_capped_at_two_decimal_places() {
        assert!(ensure_valid_price(&dec!(100.999)).is_err());
        assert!(ensure_valid_price(&dec!(0.001)).is_err());
        assert!(ensure_valid_price(&dec!(100.99)).is_ok());
        // Trailing zeros beyond 2 places carry no extra precision
        assert!(ensure_valid_price(&dec!(100.990)).is_ok());
    }

    #[test]
    fn update_input_distinguishes_absent_from_cleared() {
        let input = UpdateProductInput {
            category_id: Some(None),
            ..Default::default()
        };
        assert_eq!(input.category_id, Some(None));
        assert!(input.label.is_none());

        let untouched = UpdateProductInput::default();
        assert!(untouched.category_id.is_none());
    }
}
