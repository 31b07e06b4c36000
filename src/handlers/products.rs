use crate::handlers::common::{
    created_response, map_service_error, no_content_response, normalize_optional_string,
    normalize_string, success_response, validate_input,
};
use crate::handlers::promotions::PromotionResponse;
use crate::pricing::{active_discount_percent, effective_price, PriceQuote};
use crate::services::products::{CreateProductInput, ProductWithContext, UpdateProductInput};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::ProductModel;

/// Page size of the filtered listing. Fixed, not configurable.
pub const FILTERED_PAGE_SIZE: u64 = 5;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/filtered", get(list_products_filtered))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/category", put(set_product_category))
        .route("/:id/promotions", get(list_product_promotions))
}

/// Distinguishes an absent field from an explicit null in partial updates.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// List products with their customer-facing pricing
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListingParams),
    responses(
        (status = 200, description = "Products retrieved", body = Vec<ProductListing>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let today = Utc::now().date_naive();

    let items = match params.page {
        Some(page) => {
            let page = page.max(1);
            let (items, _count) = state
                .services
                .products
                .list_page_with_context(params.category, page, state.config.home_page_size)
                .await
                .map_err(map_service_error)?;
            items
        }
        None => state
            .services
            .products
            .list_with_context(params.category)
            .await
            .map_err(map_service_error)?,
    };

    let payload: Vec<ProductListing> = items
        .into_iter()
        .map(|item| ProductListing::resolve(item, today))
        .collect();
    Ok(success_response(payload))
}

/// List one fixed-size page of products with their customer-facing pricing
#[utoipa::path(
    get,
    path = "/api/v1/products/filtered",
    params(FilteredParams),
    responses(
        (status = 200, description = "Product page retrieved", body = FilteredProductsResponse)
    ),
    tag = "Products"
)]
pub async fn list_products_filtered(
    State(state): State<AppState>,
    Query(params): Query<FilteredParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let page = params.page.unwrap_or(1).max(1);

    let (items, count) = state
        .services
        .products
        .list_page_with_context(params.category, page, FILTERED_PAGE_SIZE)
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductListing> = items
        .into_iter()
        .map(|item| ProductListing::resolve(item, today))
        .collect();

    Ok(success_response(FilteredProductsResponse {
        count,
        page_size: FILTERED_PAGE_SIZE,
        products,
    }))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let label = normalize_string(payload.label);
    if label.is_empty() {
        return Err(ApiError::ValidationError(
            "Product label cannot be blank".to_string(),
        ));
    }

    let input = CreateProductInput {
        label,
        description: normalize_optional_string(payload.description),
        price: payload.price,
        image_url: normalize_optional_string(payload.image_url),
        category_id: payload.category_id,
        created_by: payload.created_by,
    };

    let product = state
        .services
        .products
        .create_product(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/:id",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product retrieved", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Partially update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/:id",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let label = match payload.label {
        Some(label) => {
            let label = normalize_string(label);
            if label.is_empty() {
                return Err(ApiError::ValidationError(
                    "Product label cannot be blank".to_string(),
                ));
            }
            Some(label)
        }
        None => None,
    };

    let input = UpdateProductInput {
        label,
        description: payload.description,
        price: payload.price,
        image_url: payload.image_url.map(normalize_optional_string),
        category_id: payload.category_id,
        actor: payload.actor,
    };

    let product = state
        .services
        .products
        .update_product(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Move a product into a category by label
#[utoipa::path(
    put,
    path = "/api/v1/products/:id/category",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SetCategoryRequest,
    responses(
        (status = 200, description = "Product moved", body = ProductResponse),
        (status = 404, description = "Product or category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn set_product_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .set_product_category(id, payload.category_label.trim())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Delete a product and its promotions
#[utoipa::path(
    delete,
    path = "/api/v1/products/:id",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// List every promotion stored for a product
#[utoipa::path(
    get,
    path = "/api/v1/products/:id/promotions",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Promotions retrieved", body = Vec<PromotionResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_product_promotions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let promotions = state
        .services
        .products
        .promotions_for_product(id)
        .await
        .map_err(map_service_error)?;

    let payload: Vec<PromotionResponse> = promotions.into_iter().map(Into::into).collect();
    Ok(success_response(payload))
}

/// Query parameters for the plain product listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListingParams {
    /// Restrict to one category
    pub category: Option<Uuid>,
    /// Optional 1-based page; page size comes from `home_page_size`
    pub page: Option<u64>,
}

/// Query parameters for the filtered product listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct FilteredParams {
    /// Restrict to one category
    pub category: Option<Uuid>,
    /// 1-based page number, defaults to 1
    pub page: Option<u64>,
}

/// Request payload to create a product
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Stratocaster")]
    pub label: String,
    pub description: Option<String>,
    /// Must be strictly positive
    #[schema(example = "1299.99", value_type = String)]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Request payload for a partial product update.
///
/// Unknown keys are rejected. `image_url` and `category_id` accept an
/// explicit `null` to clear the field; leaving them out leaves the stored
/// value untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub label: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    /// Acting administrator, stamped on the product as its creator
    pub actor: Option<Uuid>,
}

/// Request payload to move a product into a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub category_label: String,
}

/// Paginated wrapper returned by the filtered listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilteredProductsResponse {
    /// Total matching products before pagination
    pub count: u64,
    /// Fixed page size
    pub page_size: u64,
    pub products: Vec<ProductListing>,
}

/// Customer-facing product representation with resolved pricing.
///
/// Field names follow the storefront contract, including the French
/// pricing keys.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListing {
    pub id: Uuid,
    #[schema(example = "Stratocaster")]
    pub label: String,
    pub description: String,
    pub image: Option<String>,
    pub category_label: Option<String>,
    /// Base price, before any promotion
    #[schema(example = "1299.99", value_type = String)]
    pub price: Decimal,
    /// Whether a promotion window covers today
    pub est_en_promotion: bool,
    /// Discounted price, or the string "no active promotion"
    #[schema(value_type = String)]
    pub retourner_prix: PriceQuote,
    /// Active discount percent, zero when none applies
    #[schema(example = "40", value_type = String)]
    pub valeur_promotion: Decimal,
}

impl ProductListing {
    /// Resolves a product and its promotion set into the wire shape for
    /// one specific day.
    pub fn resolve(item: ProductWithContext, today: NaiveDate) -> Self {
        let quote = effective_price(item.product.price, &item.promotions, today);
        let percent = active_discount_percent(&item.promotions, today);

        Self {
            id: item.product.id,
            label: item.product.label,
            description: item.product.description,
            image: item.product.image_url,
            category_label: item.category_label,
            price: item.product.price,
            est_en_promotion: quote.is_discounted(),
            retourner_prix: quote,
            valeur_promotion: percent,
        }
    }
}

/// Administrative product representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub label: String,
    pub description: String,
    #[schema(example = "1299.99", value_type = String)]
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ProductModel> for ProductResponse {
    fn from(product: ProductModel) -> Self {
        Self {
            id: product.id,
            label: product.label,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            category_id: product.category_id,
            created_by: product.created_by,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::promotion;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_context(promotions: Vec<promotion::Model>) -> ProductWithContext {
        ProductWithContext {
            product: ProductModel {
                id: Uuid::new_v4(),
                label: "Stratocaster".to_string(),
                description: "Sunburst finish".to_string(),
                price: dec!(2600.79),
                image_url: None,
                category_id: None,
                created_by: None,
                created_at: Utc::now(),
                updated_at: None,
            },
            category_label: Some("Guitares".to_string()),
            promotions,
        }
    }

    #[test]
    fn listing_resolves_active_promotion() {
        let product_id = Uuid::new_v4();
        let item = sample_context(vec![promotion::Model {
            id: Uuid::new_v4(),
            start_date: date(2023, 10, 1),
            end_date: date(2023, 10, 31),
            percent: dec!(40),
            product_id,
        }]);

        let listing = ProductListing::resolve(item, date(2023, 10, 15));
        assert!(listing.est_en_promotion);
        assert_eq!(listing.valeur_promotion, dec!(40));
        assert_eq!(listing.retourner_prix, PriceQuote::Discounted(dec!(1560.47)));
    }

    #[test]
    fn listing_serializes_french_pricing_keys() {
        let listing = ProductListing::resolve(sample_context(vec![]), date(2023, 10, 15));
        let json = serde_json::to_value(&listing).unwrap();

        assert_eq!(json["est_en_promotion"], serde_json::json!(false));
        assert_eq!(
            json["retourner_prix"],
            serde_json::json!("no active promotion")
        );
        assert_eq!(json["valeur_promotion"], serde_json::json!("0"));
        assert_eq!(json["category_label"], serde_json::json!("Guitares"));
    }

    #[test]
    fn update_request_rejects_unknown_keys() {
        let err = serde_json::from_str::<UpdateProductRequest>(r#"{"nonsense": 1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let cleared: UpdateProductRequest =
            serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));

        let untouched: UpdateProductRequest = serde_json::from_str("{}").unwrap();
        assert!(untouched.category_id.is_none());
    }
}
