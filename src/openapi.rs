use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = r#"
# Catalog API

Back office for an online catalog: products, categories, and time-bounded
percentage promotions.

## Promotions

A promotion is a discount window with a percent strictly between 0 and 50.
Windows for the same product may never overlap, past or future; expired
windows no longer block new ones. The read API resolves each product's
effective price for the current day and reports it under the storefront
field names (`est_en_promotion`, `retourner_prix`, `valeur_promotion`).

## Error Handling

Failing endpoints return a consistent error body:

```json
{
  "error": "Bad Request",
  "message": "Validation error: percent must be strictly between 0 and 50, got 80",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Category directory endpoints"),
        (name = "Products", description = "Product catalog and pricing endpoints"),
        (name = "Promotions", description = "Promotion lifecycle endpoints")
    ),
    paths(
        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::rename_category,
        crate::handlers::categories::delete_category,
        crate::handlers::categories::list_products_in_category,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::list_products_filtered,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::set_product_category,
        crate::handlers::products::delete_product,
        crate::handlers::products::list_product_promotions,

        // Promotions
        crate::handlers::promotions::create_promotion,
        crate::handlers::promotions::get_promotion,
        crate::handlers::promotions::delete_promotion,
        crate::handlers::promotions::purge_expired,
    ),
    components(
        schemas(
            crate::handlers::categories::CategoryResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::RenameCategoryRequest,

            crate::handlers::products::ProductResponse,
            crate::handlers::products::ProductListing,
            crate::handlers::products::FilteredProductsResponse,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::products::SetCategoryRequest,

            crate::handlers::promotions::PromotionResponse,
            crate::handlers::promotions::CreatePromotionRequest,
            crate::handlers::promotions::PurgeResponse,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
