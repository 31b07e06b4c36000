use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{promotion, Product, Promotion, PromotionModel},
    errors::ServiceError,
    events::{Event, EventSender},
    pricing::{validate_window, CandidateWindow},
};

/// Promotion lifecycle: validation-gated creation, individual deletion, and
/// the bulk purge of expired windows.
#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a promotion after running the window validator against every
    /// promotion stored for the product.
    ///
    /// Validation and insert run inside one transaction holding an exclusive
    /// lock on the product row, so two overlapping windows cannot both pass
    /// the check and then both persist.
    #[instrument(skip(self))]
    pub async fn create_promotion(
        &self,
        input: CreatePromotionInput,
        today: NaiveDate,
    ) -> Result<PromotionModel, ServiceError> {
        let txn = self.db.begin().await?;

        Product::find_by_id(input.product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let existing = Promotion::find()
            .filter(promotion::Column::ProductId.eq(input.product_id))
            .all(&txn)
            .await?;

        let candidate = CandidateWindow {
            start_date: input.start_date,
            end_date: input.end_date,
            percent: input.percent,
        };
        validate_window(&candidate, &existing, today)
            .map_err(|rejection| ServiceError::ValidationError(rejection.to_string()))?;

        let promotion_id = Uuid::new_v4();
        let promotion = promotion::ActiveModel {
            id: Set(promotion_id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            percent: Set(input.percent),
            product_id: Set(input.product_id),
        };

        let promotion = promotion.insert(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PromotionCreated {
                promotion_id,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Created promotion {} on product {} from {} to {}",
            promotion_id, input.product_id, input.start_date, input.end_date
        );
        Ok(promotion)
    }

    /// Get a promotion by ID.
    #[instrument(skip(self))]
    pub async fn get_promotion(&self, promotion_id: Uuid) -> Result<PromotionModel, ServiceError> {
        Promotion::find_by_id(promotion_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Promotion {} not found", promotion_id)))
    }

    /// Delete a promotion by ID; a missing ID is a not-found result.
    #[instrument(skip(self))]
    pub async fn delete_promotion(&self, promotion_id: Uuid) -> Result<(), ServiceError> {
        let result = Promotion::delete_by_id(promotion_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Promotion {} not found",
                promotion_id
            )));
        }

        self.event_sender
            .send_or_log(Event::PromotionDeleted(promotion_id))
            .await;

        info!("Deleted promotion {}", promotion_id);
        Ok(())
    }

    /// Delete every promotion whose end date is strictly before `today`.
    ///
    /// `today` is evaluated once by the caller, so every row is judged
    /// against the same day; running the purge twice in a row deletes
    /// nothing the second time.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self, today: NaiveDate) -> Result<u64, ServiceError> {
        let result = Promotion::delete_many()
            .filter(promotion::Column::EndDate.lt(today))
            .exec(&*self.db)
            .await?;

        let deleted = result.rows_affected;
        if deleted > 0 {
            self.event_sender
                .send_or_log(Event::PromotionsPurged { deleted })
                .await;
        }

        info!("Purged {} expired promotions", deleted);
        Ok(deleted)
    }
}

/// Input for creating a promotion
#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePromotionInput {
    pub product_id: Uuid,
    pub percent: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
