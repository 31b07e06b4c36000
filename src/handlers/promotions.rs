use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::services::promotions::CreatePromotionInput;
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::PromotionModel;

/// Creates the router for promotion endpoints
pub fn promotions_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_promotion))
        .route("/purge", post(purge_expired))
        .route("/:id", get(get_promotion))
        .route("/:id", delete(delete_promotion))
}

/// Create a promotion after validating its window
#[utoipa::path(
    post,
    path = "/api/v1/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Promotion created", body = PromotionResponse),
        (status = 400, description = "Window rejected", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    Json(payload): Json<CreatePromotionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreatePromotionInput {
        product_id: payload.product_id,
        percent: payload.percent,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };

    let today = Utc::now().date_naive();
    let promotion = state
        .services
        .promotions
        .create_promotion(input, today)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(PromotionResponse::from(promotion)))
}

/// Get a promotion by ID
#[utoipa::path(
    get,
    path = "/api/v1/promotions/:id",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 200, description = "Promotion retrieved", body = PromotionResponse),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let promotion = state
        .services
        .promotions
        .get_promotion(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PromotionResponse::from(promotion)))
}

/// Delete a promotion
#[utoipa::path(
    delete,
    path = "/api/v1/promotions/:id",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 204, description = "Promotion deleted"),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn delete_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .promotions
        .delete_promotion(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Delete every expired promotion
#[utoipa::path(
    post,
    path = "/api/v1/promotions/purge",
    responses(
        (status = 200, description = "Expired promotions purged", body = PurgeResponse)
    ),
    tag = "Promotions"
)]
pub async fn purge_expired(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let deleted = state
        .services
        .promotions
        .purge_expired(today)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PurgeResponse { deleted }))
}

/// Request payload to create a promotion
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromotionRequest {
    pub product_id: Uuid,
    /// Discount percent, strictly between 0 and 50
    #[schema(example = "40", value_type = String)]
    pub percent: Decimal,
    #[schema(example = "2024-02-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-01")]
    pub end_date: NaiveDate,
}

/// Promotion representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromotionResponse {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(example = "40", value_type = String)]
    pub percent: Decimal,
    pub product_id: Uuid,
}

impl From<PromotionModel> for PromotionResponse {
    fn from(promotion: PromotionModel) -> Self {
        Self {
            id: promotion.id,
            start_date: promotion.start_date,
            end_date: promotion.end_date,
            percent: promotion.percent,
            product_id: promotion.product_id,
        }
    }
}

/// Result of a purge run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurgeResponse {
    /// Number of promotions removed
    pub deleted: u64,
}
