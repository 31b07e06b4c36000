use crate::handlers::common::{
    created_response, map_service_error, no_content_response, normalize_string, success_response,
    validate_input,
};
use crate::handlers::products::ProductResponse;
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::CategoryModel;

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/:id", get(get_category))
        .route("/:id", put(rename_category))
        .route("/:id", delete(delete_category))
        // The router requires one param name per position, so the label
        // lookup shares the ":id" segment
        .route("/:id/products", get(list_products_in_category))
}

/// List all categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories retrieved", body = Vec<CategoryResponse>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .categories
        .list_categories()
        .await
        .map_err(map_service_error)?;

    let payload: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(success_response(payload))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Label already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let label = normalize_string(payload.label);
    if label.is_empty() {
        return Err(ApiError::ValidationError(
            "Category label cannot be blank".to_string(),
        ));
    }

    let category = state
        .services
        .categories
        .create_category(label)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CategoryResponse::from(category)))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category retrieved", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CategoryResponse::from(category)))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/:id",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = RenameCategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Label already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let label = normalize_string(payload.label);
    if label.is_empty() {
        return Err(ApiError::ValidationError(
            "Category label cannot be blank".to_string(),
        ));
    }

    let category = state
        .services
        .categories
        .rename_category(id, label)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CategoryResponse::from(category)))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/:id",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .categories
        .delete_category(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// List the products in a category, looked up by exact label
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id/products",
    params(
        ("id" = String, Path, description = "Category label (exact match)")
    ),
    responses(
        (status = 200, description = "Products retrieved", body = Vec<ProductResponse>),
        (status = 404, description = "No category with that label", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn list_products_in_category(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let products = state
        .services
        .categories
        .list_products_in_category(&label)
        .await
        .map_err(map_service_error)?;

    let payload: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(success_response(payload))
}

/// Request payload to create a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    /// Category label, unique across categories
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Guitares")]
    pub label: String,
}

/// Request payload to rename a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Claviers")]
    pub label: String,
}

/// Category representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Guitares")]
    pub label: String,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(category: CategoryModel) -> Self {
        Self {
            id: category.id,
            label: category.label,
        }
    }
}
