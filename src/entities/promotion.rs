use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Promotion entity: a time-bounded percentage discount on one product.
///
/// Window and percent invariants are enforced by the validation gate in
/// [`crate::pricing`] before any row is written; the entity itself stays a
/// plain record.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// First day the discount applies (inclusive)
    pub start_date: Date,

    /// Last day the discount applies (inclusive)
    pub end_date: Date,

    /// Discount percentage, 2 fractional digits, strictly between 0 and 50
    pub percent: Decimal,

    /// Product the promotion belongs to; deleting the product deletes the promotion
    pub product_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
