use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog product. Standard products price through `price`/`gp_percentage`/
/// `total_price`; bundles through the `bundle_*` columns. Which set is
/// populated is decided by `product_type` and written only via
/// `services::pricing::ProductPricing`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub product_type: ProductType,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub short_description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub default_category_id: Uuid,
    pub default_supplier_id: Option<Uuid>,
    pub status: ProductStatus,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub gp_percentage: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub total_price: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub bundle_gp_percentage: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub bundle_subtotal: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub bundle_final_price: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub rrp_cost: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub override_rrp_cost: Option<Decimal>,

    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Price a shopper pays before customer-group overrides.
    pub fn sell_price(&self) -> Option<Decimal> {
        match self.product_type {
            ProductType::Standard => self.total_price,
            ProductType::Bundle => self.bundle_final_price,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "bundle")]
    Bundle,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "draft")]
    Draft,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::DefaultCategoryId",
        to = "super::category::Column::Id"
    )]
    DefaultCategory,

    #[sea_orm(has_many = "super::product_image::Entity")]
    Images,

    #[sea_orm(has_many = "super::customer_group_price::Entity")]
    CustomerGroupPrices,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefaultCategory.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::customer_group_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerGroupPrices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
