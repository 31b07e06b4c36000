pub mod categories;
pub mod products;
pub mod promotions;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;

pub use categories::CategoryService;
pub use products::ProductService;
pub use promotions::PromotionService;

/// Aggregates the services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub promotions: Arc<PromotionService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            categories: Arc::new(CategoryService::new(db.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db.clone(), event_sender.clone())),
            promotions: Arc::new(PromotionService::new(db, event_sender)),
        }
    }
}
