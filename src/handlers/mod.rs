pub mod categories;
pub mod common;
pub mod products;
pub mod promotions;

pub use categories::categories_routes;
pub use products::products_routes;
pub use promotions::promotions_routes;
