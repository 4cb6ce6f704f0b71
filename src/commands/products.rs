use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{validate_money, validate_not_blank, validate_percentage};
use crate::entities::{PriceType, ProductStatus, ProductType};

fn default_status() -> ProductStatus {
    ProductStatus::Active
}

fn default_quantity() -> u32 {
    1
}

/// One component line of a bundle.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BundleItemInput {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 10000, message = "quantity must be at least 1"))]
    pub quantity: u32,
    /// Per-line price. Zero or absent means the component's own total.
    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SupplierInput {
    pub supplier_id: Uuid,
    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerGroupPriceInput {
    pub customer_group_id: Uuid,
    pub price_type: PriceType,
    #[validate(custom = "validate_money")]
    pub amount: Decimal,
}

/// A new image carried inline as base64.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewImageInput {
    #[validate(length(min = 1, max = 255, message = "file_name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "image content is required"))]
    pub content_base64: String,
    #[validate(length(max = 255))]
    pub alt: Option<String>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub caption: Option<String>,
    /// Appended after the current last image when absent.
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Metadata edit for an image the product already owns. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ExistingImageInput {
    pub id: Uuid,
    #[validate(length(max = 255))]
    pub alt: Option<String>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub caption: Option<String>,
    pub sort_order: Option<i32>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductCommand {
    pub product_type: ProductType,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub sku: String,
    /// Base text for the slug. Defaults to `name`.
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub short_description: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: ProductStatus,

    pub default_category_id: Uuid,
    #[validate(length(min = 1, message = "at least one category is required"))]
    pub categories: Vec<Uuid>,
    #[serde(default)]
    pub compatible_products: Vec<Uuid>,
    #[serde(default)]
    #[validate]
    pub bundle_items: Vec<BundleItemInput>,
    #[serde(default)]
    #[validate]
    pub suppliers: Vec<SupplierInput>,
    pub default_supplier_id: Option<Uuid>,
    #[serde(default)]
    #[validate]
    pub customer_group_prices: Vec<CustomerGroupPriceInput>,

    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub gp_percentage: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub bundle_gp_percentage: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub rrp_cost: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub override_rrp_cost: Option<Decimal>,

    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,

    #[serde(default)]
    #[validate]
    pub images: Vec<NewImageInput>,
}

/// Full replacement of a product plus image edits.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductCommand {
    pub product_type: ProductType,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub sku: String,
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub short_description: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: ProductStatus,

    pub default_category_id: Uuid,
    #[validate(length(min = 1, message = "at least one category is required"))]
    pub categories: Vec<Uuid>,
    #[serde(default)]
    pub compatible_products: Vec<Uuid>,
    #[serde(default)]
    #[validate]
    pub bundle_items: Vec<BundleItemInput>,
    #[serde(default)]
    #[validate]
    pub suppliers: Vec<SupplierInput>,
    pub default_supplier_id: Option<Uuid>,
    #[serde(default)]
    #[validate]
    pub customer_group_prices: Vec<CustomerGroupPriceInput>,

    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub gp_percentage: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub bundle_gp_percentage: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub rrp_cost: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub override_rrp_cost: Option<Decimal>,

    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,

    #[serde(default)]
    #[validate]
    pub images: Vec<NewImageInput>,
    #[serde(default)]
    #[validate]
    pub existing_images: Vec<ExistingImageInput>,
    #[serde(default)]
    pub deleted_image_ids: Vec<Uuid>,
}

impl From<CreateProductCommand> for UpdateProductCommand {
    fn from(cmd: CreateProductCommand) -> Self {
        Self {
            product_type: cmd.product_type,
            name: cmd.name,
            sku: cmd.sku,
            slug: cmd.slug,
            short_description: cmd.short_description,
            description: cmd.description,
            status: cmd.status,
            default_category_id: cmd.default_category_id,
            categories: cmd.categories,
            compatible_products: cmd.compatible_products,
            bundle_items: cmd.bundle_items,
            suppliers: cmd.suppliers,
            default_supplier_id: cmd.default_supplier_id,
            customer_group_prices: cmd.customer_group_prices,
            price: cmd.price,
            gp_percentage: cmd.gp_percentage,
            bundle_gp_percentage: cmd.bundle_gp_percentage,
            rrp_cost: cmd.rrp_cost,
            override_rrp_cost: cmd.override_rrp_cost,
            meta_title: cmd.meta_title,
            meta_description: cmd.meta_description,
            images: cmd.images,
            existing_images: Vec::new(),
            deleted_image_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetProductStatusCommand {
    pub status: ProductStatus,
}
