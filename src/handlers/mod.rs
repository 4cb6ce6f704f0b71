pub mod categories;
pub mod common;
pub mod customer_groups;
pub mod health;
pub mod products;
pub mod storefront;
pub mod suppliers;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::{
    CategoryService, CustomerGroupService, ProductService, StorefrontService, StorefrontSettings,
    SupplierService,
};
use crate::storage::ImageStorage;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub suppliers: Arc<SupplierService>,
    pub customer_groups: Arc<CustomerGroupService>,
    pub storefront: Arc<StorefrontService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn ImageStorage>,
        config: &AppConfig,
    ) -> Self {
        Self {
            categories: Arc::new(CategoryService::new(db.clone())),
            products: Arc::new(ProductService::new(db.clone(), storage)),
            suppliers: Arc::new(SupplierService::new(db.clone())),
            customer_groups: Arc::new(CustomerGroupService::new(db.clone())),
            storefront: Arc::new(StorefrontService::new(
                db,
                StorefrontSettings::from(config),
            )),
        }
    }
}
