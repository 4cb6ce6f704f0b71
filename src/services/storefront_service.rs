//! Public, read-only view of the catalog.
//!
//! Only active products and active categories are visible. Prices are the
//! base price (override cost, then RRP cost, then the computed sell price),
//! optionally adjusted by a customer-group rule.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::{
    product, product_image, CategoryModel, CustomerGroup, ProductImage, ProductImageModel,
    ProductModel, ProductStatus,
};
use crate::errors::ServiceError;
use crate::repositories::{CategoryRepository, ProductFilter, ProductRepository, ProductSort};
use crate::services::category_tree::CategoryTreeNode;
use crate::services::pricing::{self, GroupPriceRule};

/// Listing parameters for the public product list.
#[derive(Debug, Clone, Default)]
pub struct StorefrontQuery {
    /// `slug_url` of a category; its whole subtree is included.
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub page: u64,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StorefrontProduct {
    pub product: ProductModel,
    pub price: Decimal,
    pub primary_image: Option<ProductImageModel>,
}

#[derive(Debug, Clone)]
pub struct ResolvedProduct {
    pub product: ProductModel,
    /// Display order.
    pub images: Vec<ProductImageModel>,
    pub primary_image_id: Option<Uuid>,
    pub default_category: CategoryModel,
    pub price: Decimal,
    /// Present only when an active customer group has a rule for the product.
    pub customer_group_price: Option<Decimal>,
    pub related: Vec<StorefrontProduct>,
}

/// What a public catalog path points at.
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    Category {
        category: CategoryModel,
        children: Vec<CategoryModel>,
    },
    Product(Box<ResolvedProduct>),
}

#[derive(Debug, Clone, Copy)]
pub struct StorefrontSettings {
    pub page_size: u64,
    pub max_page_size: u64,
    pub related_limit: u64,
}

impl From<&AppConfig> for StorefrontSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            page_size: cfg.storefront_page_size,
            max_page_size: cfg.api_max_page_size,
            related_limit: cfg.related_products_limit,
        }
    }
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_page_size: 200,
            related_limit: 4,
        }
    }
}

#[derive(Clone)]
pub struct StorefrontService {
    db: Arc<DatabaseConnection>,
    settings: StorefrontSettings,
}

impl StorefrontService {
    pub fn new(db: Arc<DatabaseConnection>, settings: StorefrontSettings) -> Self {
        Self { db, settings }
    }

    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.settings.page_size)
            .clamp(1, self.settings.max_page_size.max(1))
    }

    /// Active products, optionally limited to a category subtree
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        query: &StorefrontQuery,
    ) -> Result<(Vec<StorefrontProduct>, u64), ServiceError> {
        let db = self.db.as_ref();
        let category_ids = match query.category.as_deref() {
            Some(slug_url) => Some(self.category_subtree(slug_url).await?),
            None => None,
        };

        let filter = ProductFilter {
            search: query.search.clone(),
            status: Some(ProductStatus::Active),
            product_type: None,
            category_ids,
            supplier_ids: None,
        };
        let (items, total) = ProductRepository::new(db)
            .list(&filter, query.sort, query.page, self.page_size(query.per_page))
            .await?;

        Ok((with_primary_images(db, items).await?, total))
    }

    /// Active categories as a nested tree; an inactive category hides its
    /// subtree
    pub async fn category_tree(&self) -> Result<Vec<CategoryTreeNode>, ServiceError> {
        let tree = CategoryRepository::new(self.db.as_ref()).load_tree().await?;
        Ok(tree.nested(true))
    }

    pub async fn featured_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(CategoryRepository::new(self.db.as_ref())
            .featured(true)
            .await?)
    }

    /// Resolves a public path to a category or a product.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        path: &str,
        customer_group_id: Option<Uuid>,
    ) -> Result<CatalogEntry, ServiceError> {
        let path = path.trim().trim_matches('/');
        if path.is_empty() {
            return Err(ServiceError::invalid("path", "must not be empty"));
        }

        let db = self.db.as_ref();
        let categories = CategoryRepository::new(db);
        if let Some(category) = categories
            .find_by_slug_url(path)
            .await?
            .filter(|c| c.is_active)
        {
            let children = categories
                .list_children(category.id)
                .await?
                .into_iter()
                .filter(|c| c.is_active)
                .collect();
            return Ok(CatalogEntry::Category { category, children });
        }

        let not_found = || ServiceError::NotFound(format!("Nothing found at /{}", path));
        let (prefix, product_slug) = path.rsplit_once('/').ok_or_else(not_found)?;

        let products = ProductRepository::new(db);
        let product = products
            .find_product_by_slug(product_slug, None)
            .await?
            .filter(ProductModel::is_active)
            .ok_or_else(not_found)?;
        let default_category = match categories.find_category(product.default_category_id).await? {
            Some(category) if category.slug_url == prefix => category,
            Some(_) => return Err(not_found()),
            None => {
                debug!(product_id = %product.id, "default category row is missing");
                return Err(not_found());
            }
        };

        let page = self
            .product_page(&products, product, default_category, customer_group_id)
            .await?;
        Ok(CatalogEntry::Product(Box::new(page)))
    }

    /// Active product by its catalog-wide slug, without a category path.
    #[instrument(skip(self))]
    pub async fn product_by_slug(
        &self,
        slug: &str,
        customer_group_id: Option<Uuid>,
    ) -> Result<ResolvedProduct, ServiceError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(ServiceError::invalid("slug", "must not be empty"));
        }

        let db = self.db.as_ref();
        let not_found = || ServiceError::NotFound(format!("Product {} not found", slug));
        let products = ProductRepository::new(db);
        let product = products
            .find_product_by_slug(slug, None)
            .await?
            .filter(ProductModel::is_active)
            .ok_or_else(not_found)?;
        let Some(default_category) = CategoryRepository::new(db)
            .find_category(product.default_category_id)
            .await?
        else {
            debug!(product_id = %product.id, "default category row is missing");
            return Err(not_found());
        };

        self.product_page(&products, product, default_category, customer_group_id)
            .await
    }

    async fn product_page<C: ConnectionTrait>(
        &self,
        products: &ProductRepository<'_, C>,
        product: ProductModel,
        default_category: CategoryModel,
        customer_group_id: Option<Uuid>,
    ) -> Result<ResolvedProduct, ServiceError> {
        let base = base_price(&product);
        let customer_group_price = match customer_group_id {
            Some(group_id) => self.group_price(products, product.id, group_id, base).await?,
            None => None,
        };

        let images = products.images(product.id).await?;
        let primary_image_id = product_image::primary_of(&images).map(|img| img.id);
        let related = products
            .related(&product, self.settings.related_limit)
            .await?;
        let related = with_primary_images(self.db.as_ref(), related).await?;

        Ok(ResolvedProduct {
            product,
            images,
            primary_image_id,
            default_category,
            price: base,
            customer_group_price,
            related,
        })
    }

    async fn category_subtree(&self, slug_url: &str) -> Result<Vec<Uuid>, ServiceError> {
        let slug_url = slug_url.trim().trim_matches('/');
        let repo = CategoryRepository::new(self.db.as_ref());
        let category = repo
            .find_by_slug_url(slug_url)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", slug_url)))?;

        let tree = repo.load_tree().await?;
        let mut ids = vec![category.id];
        ids.extend(tree.descendant_ids(category.id));
        Ok(ids)
    }

    /// Group price for an active group with a rule for this product.
    async fn group_price<C: ConnectionTrait>(
        &self,
        products: &ProductRepository<'_, C>,
        product_id: Uuid,
        group_id: Uuid,
        base: Decimal,
    ) -> Result<Option<Decimal>, ServiceError> {
        let group = CustomerGroup::find_by_id(group_id)
            .one(self.db.as_ref())
            .await?;
        if !group.is_some_and(|g| g.is_active) {
            return Ok(None);
        }
        let rule = products.group_price(product_id, group_id).await?;
        Ok(rule.map(|row| pricing::resolve_customer_price(base, Some(GroupPriceRule::from(&row)))))
    }
}

fn base_price(product: &ProductModel) -> Decimal {
    pricing::base_price(
        product.override_rrp_cost,
        product.rrp_cost,
        product.sell_price().unwrap_or(Decimal::ZERO),
    )
}

/// Pairs each product with its primary image using one image query.
async fn with_primary_images<C: ConnectionTrait>(
    conn: &C,
    items: Vec<ProductModel>,
) -> Result<Vec<StorefrontProduct>, ServiceError> {
    let ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
    let mut images: HashMap<Uuid, Vec<ProductImageModel>> = HashMap::new();
    if !ids.is_empty() {
        for image in ProductImage::find()
            .filter(product_image::Column::ProductId.is_in(ids))
            .all(conn)
            .await?
        {
            images.entry(image.product_id).or_default().push(image);
        }
    }

    Ok(items
        .into_iter()
        .map(|product| {
            let primary_image = images
                .get(&product.id)
                .and_then(|list| product_image::primary_of(list))
                .cloned();
            StorefrontProduct {
                price: base_price(&product),
                product,
                primary_image,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ProductType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(total: Option<Decimal>, rrp: Option<Decimal>, override_cost: Option<Decimal>) -> ProductModel {
        let now = Utc::now();
        ProductModel {
            id: Uuid::new_v4(),
            product_type: ProductType::Standard,
            name: "Lamp".into(),
            sku: "L-1".into(),
            slug: "lamp".into(),
            short_description: None,
            description: None,
            default_category_id: Uuid::new_v4(),
            default_supplier_id: None,
            status: ProductStatus::Active,
            price: Some(dec!(20)),
            gp_percentage: Some(dec!(10)),
            total_price: total,
            bundle_gp_percentage: None,
            bundle_subtotal: None,
            bundle_final_price: None,
            rrp_cost: rrp,
            override_rrp_cost: override_cost,
            meta_title: None,
            meta_description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn base_price_prefers_override_then_rrp() {
        assert_eq!(base_price(&product(Some(dec!(22)), None, None)), dec!(22));
        assert_eq!(base_price(&product(Some(dec!(22)), Some(dec!(30)), None)), dec!(30));
        assert_eq!(
            base_price(&product(Some(dec!(22)), Some(dec!(30)), Some(dec!(25)))),
            dec!(25)
        );
        assert_eq!(base_price(&product(None, None, None)), Decimal::ZERO);
    }

    #[test]
    fn page_size_defaults_and_clamps() {
        let settings = StorefrontSettings {
            page_size: 50,
            max_page_size: 100,
            related_limit: 4,
        };
        let db = Arc::new(DatabaseConnection::Disconnected);
        let service = StorefrontService::new(db, settings);
        assert_eq!(service.page_size(None), 50);
        assert_eq!(service.page_size(Some(0)), 1);
        assert_eq!(service.page_size(Some(500)), 100);
    }
}
