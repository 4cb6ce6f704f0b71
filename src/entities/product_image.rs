use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub product_id: Uuid,

    /// Opaque key understood by the configured `ImageStorage`.
    pub path: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Display order: `sort_order`, then upload time, then id.
pub fn display_order(a: &Model, b: &Model) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

/// Picks the primary image of a product.
///
/// Flagged images win over unflagged ones; ties among flagged images fall to
/// [`display_order`]. With no flag set the first image in display order is
/// primary.
pub fn primary_of(images: &[Model]) -> Option<&Model> {
    images
        .iter()
        .filter(|img| img.is_primary)
        .min_by(|a, b| display_order(a, b))
        .or_else(|| images.iter().min_by(|a, b| display_order(a, b)))
}
