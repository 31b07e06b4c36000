pub mod category;
pub mod product;
pub mod promotion;

pub use category::Entity as Category;
pub use category::Model as CategoryModel;
pub use product::Entity as Product;
pub use product::Model as ProductModel;
pub use promotion::Entity as Promotion;
pub use promotion::Model as PromotionModel;
