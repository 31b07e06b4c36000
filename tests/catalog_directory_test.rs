mod common;

use axum::http::{Method, StatusCode};
use catalog_api::{errors::ServiceError, services::products::CreateProductInput};
use common::TestApp;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn categories_list_ordered_by_label() {
    let app = TestApp::new().await;
    let service = app.state.services.categories.clone();

    service.create_category("Pianos".to_string()).await.unwrap();
    service
        .create_category("Guitares".to_string())
        .await
        .unwrap();
    service
        .create_category("Claviers".to_string())
        .await
        .unwrap();

    let categories = service.list_categories().await.unwrap();
    let labels: Vec<&str> = categories.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Claviers", "Guitares", "Pianos"]);
}

#[tokio::test]
async fn duplicate_label_is_a_conflict() {
    let app = TestApp::new().await;
    let service = app.state.services.categories.clone();

    service
        .create_category("Guitares".to_string())
        .await
        .unwrap();
    let err = service
        .create_category("Guitares".to_string())
        .await
        .expect_err("duplicate label should be rejected");

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn rename_collision_leaves_both_labels_unchanged() {
    let app = TestApp::new().await;
    let service = app.state.services.categories.clone();

    let guitars = service
        .create_category("Guitares".to_string())
        .await
        .unwrap();
    let keyboards = service
        .create_category("Claviers".to_string())
        .await
        .unwrap();

    let err = service
        .rename_category(keyboards.id, "Guitares".to_string())
        .await
        .expect_err("rename onto an existing label should be rejected");
    assert!(matches!(err, ServiceError::Conflict(_)));

    assert_eq!(
        service.get_category(guitars.id).await.unwrap().label,
        "Guitares"
    );
    assert_eq!(
        service.get_category(keyboards.id).await.unwrap().label,
        "Claviers"
    );
}

#[tokio::test]
async fn rename_to_own_label_is_a_noop() {
    let app = TestApp::new().await;
    let service = app.state.services.categories.clone();

    let guitars = service
        .create_category("Guitares".to_string())
        .await
        .unwrap();
    let renamed = service
        .rename_category(guitars.id, "Guitares".to_string())
        .await
        .expect("self-rename should succeed");
    assert_eq!(renamed.label, "Guitares");
}

#[tokio::test]
async fn products_in_category_by_exact_label() {
    let app = TestApp::new().await;
    let categories = app.state.services.categories.clone();
    let products = app.state.services.products.clone();

    let guitars = categories
        .create_category("Guitares".to_string())
        .await
        .unwrap();

    products
        .create_product(CreateProductInput {
            label: "Stratocaster".to_string(),
            description: None,
            price: dec!(1299.99),
            image_url: None,
            category_id: Some(guitars.id),
            created_by: None,
        })
        .await
        .unwrap();
    products
        .create_product(CreateProductInput {
            label: "Piano droit".to_string(),
            description: None,
            price: dec!(4500),
            image_url: None,
            category_id: None,
            created_by: None,
        })
        .await
        .unwrap();

    let in_category = categories
        .list_products_in_category("Guitares")
        .await
        .expect("lookup by label should succeed");
    assert_eq!(in_category.len(), 1);
    assert_eq!(in_category[0].label, "Stratocaster");

    let err = categories
        .list_products_in_category("guitares")
        .await
        .expect_err("label match is case-sensitive");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn deleting_category_nulls_product_reference() {
    let app = TestApp::new().await;
    let categories = app.state.services.categories.clone();
    let products = app.state.services.products.clone();

    let guitars = categories
        .create_category("Guitares".to_string())
        .await
        .unwrap();
    let product = products
        .create_product(CreateProductInput {
            label: "Stratocaster".to_string(),
            description: None,
            price: dec!(1299.99),
            image_url: None,
            category_id: Some(guitars.id),
            created_by: None,
        })
        .await
        .unwrap();

    categories.delete_category(guitars.id).await.unwrap();

    let orphaned = products.get_product(product.id).await.unwrap();
    assert_eq!(orphaned.category_id, None);
}

#[tokio::test]
async fn products_in_category_route_matches_by_label() {
    let app = TestApp::new().await;

    let guitars = app
        .state
        .services
        .categories
        .create_category("Guitares".to_string())
        .await
        .unwrap();
    app.state
        .services
        .products
        .create_product(CreateProductInput {
            label: "Stratocaster".to_string(),
            description: None,
            price: dec!(1299.99),
            image_url: None,
            category_id: Some(guitars.id),
            created_by: None,
        })
        .await
        .unwrap();

    let found = app
        .request(Method::GET, "/api/v1/categories/Guitares/products", None)
        .await;
    assert_eq!(found.status(), StatusCode::OK);
    let body = TestApp::read_json(found).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["label"], serde_json::json!("Stratocaster"));

    let missing = app
        .request(Method::GET, "/api/v1/categories/Batteries/products", None)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_category_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .categories
        .get_category(Uuid::new_v4())
        .await
        .expect_err("missing id should be rejected");
    assert!(matches!(err, ServiceError::NotFound(_)));
}
