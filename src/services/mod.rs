// Catalog engine
pub mod category_tree;
pub mod pricing;
pub mod slug;

// Admin services
pub mod category_service;
pub mod customer_group_service;
pub mod product_service;
pub mod supplier_service;

// Public read API
pub mod storefront_service;

pub use category_service::CategoryService;
pub use customer_group_service::CustomerGroupService;
pub use product_service::{ProductDetail, ProductService};
pub use storefront_service::{
    CatalogEntry, ResolvedProduct, StorefrontProduct, StorefrontQuery, StorefrontService,
    StorefrontSettings,
};
pub use supplier_service::SupplierService;
