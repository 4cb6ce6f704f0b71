use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::commands::{CreateProductCommand, NewImageInput, UpdateProductCommand};
use crate::entities::{
    customer_group, product, product_image, supplier, CustomerGroup, CustomerGroupPriceModel,
    PriceType, ProductBundleModel, ProductImageModel, ProductModel, ProductStatus,
    ProductSupplierModel, ProductType, Supplier,
};
use crate::errors::{FieldErrors, ServiceError};
use crate::repositories::{
    BundleComponentRow, CategoryRepository, GroupPriceRow, ProductAssociations, ProductFilter,
    ProductRepository, ProductSort, SupplierRow,
};
use crate::services::pricing::{BundleLine, ProductPricing};
use crate::services::slug;
use crate::storage::{image_key, ImageStorage};

/// A product with every association loaded, as the admin API shows it.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub category_ids: Vec<Uuid>,
    pub compatible_product_ids: Vec<Uuid>,
    pub bundle_items: Vec<ProductBundleModel>,
    pub suppliers: Vec<ProductSupplierModel>,
    pub customer_group_prices: Vec<CustomerGroupPriceModel>,
    /// Display order.
    pub images: Vec<ProductImageModel>,
}

/// Service for managing products, their associations and images
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    storage: Arc<dyn ImageStorage>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, storage: Arc<dyn ImageStorage>) -> Self {
        Self { db, storage }
    }

    /// Creates a product with its associations, derived prices and images
    #[instrument(skip(self, command), fields(sku = %command.sku))]
    pub async fn create_product(
        &self,
        command: CreateProductCommand,
    ) -> Result<ProductDetail, ServiceError> {
        command.validate()?;
        let detail = self.write_product(None, command.into()).await?;
        info!(product_id = %detail.product.id, slug = %detail.product.slug, "Product created");
        Ok(detail)
    }

    /// Replaces a product's fields and associations and applies image edits
    #[instrument(skip(self, command), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: Uuid,
        command: UpdateProductCommand,
    ) -> Result<ProductDetail, ServiceError> {
        command.validate()?;
        let detail = self.write_product(Some(id), command).await?;
        info!(product_id = %id, slug = %detail.product.slug, "Product updated");
        Ok(detail)
    }

    /// Deletes a product that no bundle references, then its image files
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let products = ProductRepository::new(&txn);
        products.get_product(id).await?;

        let bundles = products.count_bundles_containing(id).await?;
        if bundles > 0 {
            return Err(ServiceError::Conflict(format!(
                "product {} is a component of {} bundle(s)",
                id, bundles
            )));
        }

        let paths: Vec<String> = products
            .images(id)
            .await?
            .into_iter()
            .map(|image| image.path)
            .collect();
        products.delete_product(id).await?;
        txn.commit().await?;

        self.discard_files(&paths).await;
        info!(product_id = %id, images = paths.len(), "Product deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_product_status(
        &self,
        id: Uuid,
        status: ProductStatus,
    ) -> Result<ProductModel, ServiceError> {
        let products = ProductRepository::new(self.db.as_ref());
        let current = products.get_product(id).await?;
        if current.status == status {
            return Ok(current);
        }

        let mut model = current.into_active_model();
        model.status = Set(status);
        model.updated_at = Set(Utc::now());
        let saved = products.save_product(model).await?;

        info!(product_id = %id, status = ?status, "Product status changed");
        Ok(saved)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        let products = ProductRepository::new(self.db.as_ref());
        let product = products.get_product(id).await?;
        Ok(load_detail(&products, product).await?)
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        Ok(ProductRepository::new(self.db.as_ref())
            .list(filter, sort, page, per_page)
            .await?)
    }

    /// Image files are written before the transaction opens. If the
    /// transaction fails they are removed again; files of deleted images are
    /// only removed once the transaction has committed.
    async fn write_product(
        &self,
        existing_id: Option<Uuid>,
        command: UpdateProductCommand,
    ) -> Result<ProductDetail, ServiceError> {
        let product_id = existing_id.unwrap_or_else(Uuid::new_v4);
        let decoded = check_request(product_id, &command)?;
        let staged = self
            .stage_images(product_id, &command.images, decoded)
            .await?;

        match self
            .persist(product_id, existing_id.is_some(), &command, &staged)
            .await
        {
            Ok((detail, removed)) => {
                self.discard_files(&removed).await;
                Ok(detail)
            }
            Err(err) => {
                if !staged.is_empty() {
                    warn!(
                        product_id = %product_id,
                        files = staged.len(),
                        error = %err,
                        "product write failed, removing staged images"
                    );
                }
                self.discard_files(&staged).await;
                Err(err)
            }
        }
    }

    async fn stage_images(
        &self,
        product_id: Uuid,
        images: &[NewImageInput],
        decoded: Vec<Vec<u8>>,
    ) -> Result<Vec<String>, ServiceError> {
        let mut stored = Vec::with_capacity(images.len());
        for (image, bytes) in images.iter().zip(decoded) {
            let key = image_key(product_id, &image.file_name);
            match self.storage.store(bytes, &key).await {
                Ok(path) => stored.push(path),
                Err(err) => {
                    self.discard_files(&stored).await;
                    return Err(err);
                }
            }
        }
        Ok(stored)
    }

    async fn discard_files(&self, paths: &[String]) {
        for path in paths {
            if let Err(err) = self.storage.delete(path).await {
                warn!(path = %path, error = %err, "failed to remove image file");
            }
        }
    }

    async fn persist(
        &self,
        product_id: Uuid,
        is_update: bool,
        command: &UpdateProductCommand,
        staged: &[String],
    ) -> Result<(ProductDetail, Vec<String>), ServiceError> {
        let txn = self.db.begin().await?;
        let products = ProductRepository::new(&txn);
        let categories = CategoryRepository::new(&txn);
        let exclude = is_update.then_some(product_id);

        let current = match exclude {
            Some(id) => Some(products.get_product(id).await?),
            None => None,
        };
        let is_bundle = command.product_type == ProductType::Bundle;
        let mut errors = FieldErrors::new();

        let sku = command.sku.trim().to_string();
        if products.find_product_by_sku(&sku, exclude).await?.is_some() {
            errors.add("sku", "has already been taken");
        }

        let category_ids = unique(
            std::iter::once(command.default_category_id).chain(command.categories.iter().copied()),
        );
        let known_categories: HashSet<Uuid> = categories
            .find_many(&category_ids)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if !known_categories.contains(&command.default_category_id) {
            errors.add("default_category_id", "category does not exist");
        }
        if command.categories.iter().any(|id| !known_categories.contains(id)) {
            errors.add("categories", "one or more categories do not exist");
        }

        let compatible_ids = unique(command.compatible_products.iter().copied());
        if products.find_many(&compatible_ids).await?.len() != compatible_ids.len() {
            errors.add("compatible_products", "one or more products do not exist");
        }

        let components: HashMap<Uuid, ProductModel> = if is_bundle {
            let ids = unique(command.bundle_items.iter().map(|item| item.product_id));
            let found: HashMap<Uuid, ProductModel> = products
                .find_many(&ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect();
            if found.len() != ids.len() {
                errors.add("bundle_items", "one or more component products do not exist");
            }
            if found.values().any(|p| p.product_type == ProductType::Bundle) {
                errors.add("bundle_items", "only standard products can be bundle components");
            }
            found
        } else {
            HashMap::new()
        };

        if is_bundle
            && current
                .as_ref()
                .is_some_and(|c| c.product_type == ProductType::Standard)
        {
            let bundles = products.count_bundles_containing(product_id).await?;
            if bundles > 0 {
                errors.add(
                    "product_type",
                    format!(
                        "product is a component of {} bundle(s) and must stay standard",
                        bundles
                    ),
                );
            }
        }

        let supplier_ids = unique(command.suppliers.iter().map(|s| s.supplier_id));
        if count_existing_suppliers(&txn, &supplier_ids).await? != supplier_ids.len() as u64 {
            errors.add("suppliers", "one or more suppliers do not exist");
        }

        let group_ids = unique(
            command
                .customer_group_prices
                .iter()
                .map(|p| p.customer_group_id),
        );
        if count_existing_groups(&txn, &group_ids).await? != group_ids.len() as u64 {
            errors.add("customer_group_prices", "one or more customer groups do not exist");
        }

        errors.into_result()?;

        let current_images = if is_update {
            products.images(product_id).await?
        } else {
            Vec::new()
        };
        let owned: HashMap<Uuid, &ProductImageModel> =
            current_images.iter().map(|img| (img.id, img)).collect();
        let referenced = command
            .existing_images
            .iter()
            .map(|edit| edit.id)
            .chain(command.deleted_image_ids.iter().copied());
        for image_id in referenced {
            if !owned.contains_key(&image_id) {
                return Err(ServiceError::NotFound(format!(
                    "Image {} not found for product {}",
                    image_id, product_id
                )));
            }
        }

        let name = command.name.trim().to_string();
        let explicit = command.slug.as_deref().filter(|s| !s.trim().is_empty());
        let regenerate = match &current {
            None => true,
            Some(c) => c.name != name || explicit.is_some_and(|t| slug::slugify(t) != c.slug),
        };
        let product_slug = match &current {
            Some(c) if !regenerate => c.slug.clone(),
            _ => {
                let base = slug::slugify(explicit.unwrap_or(&name));
                let taken = products.slugs_with_base(&base, exclude).await?;
                slug::unique_slug(&base, &taken)?
            }
        };

        let priced = if is_bundle {
            let lines: Vec<BundleLine> = command
                .bundle_items
                .iter()
                .map(|item| BundleLine {
                    component_total: components
                        .get(&item.product_id)
                        .and_then(|p| p.total_price),
                    override_price: item.price.unwrap_or(Decimal::ZERO),
                    quantity: item.quantity,
                })
                .collect();
            ProductPricing::bundle(command.price, command.bundle_gp_percentage, &lines)
        } else {
            ProductPricing::standard(command.price, command.gp_percentage)
        };
        let pricing = priced.map_err(|err| {
            ServiceError::invalid(if is_bundle { "bundle_items" } else { "price" }, err.to_string())
        })?;

        let now = Utc::now();
        let mut model = match current {
            Some(c) => c.into_active_model(),
            None => product::ActiveModel {
                id: Set(product_id),
                created_at: Set(now),
                ..Default::default()
            },
        };
        model.name = Set(name);
        model.sku = Set(sku);
        model.slug = Set(product_slug);
        model.short_description = Set(command.short_description.clone());
        model.description = Set(command.description.clone());
        model.status = Set(command.status);
        model.default_category_id = Set(command.default_category_id);
        model.default_supplier_id = Set(command.default_supplier_id);
        model.rrp_cost = Set(command.rrp_cost);
        model.override_rrp_cost = Set(command.override_rrp_cost);
        model.meta_title = Set(command.meta_title.clone());
        model.meta_description = Set(command.meta_description.clone());
        model.updated_at = Set(now);
        pricing.apply(&mut model);
        let saved = products.save_product(model).await?;

        let bundle_rows = if is_bundle {
            command
                .bundle_items
                .iter()
                .map(|item| BundleComponentRow {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price.unwrap_or(Decimal::ZERO),
                })
                .collect()
        } else {
            Vec::new()
        };
        let supplier_rows = command
            .suppliers
            .iter()
            .map(|s| SupplierRow {
                supplier_id: s.supplier_id,
                price: s.price.unwrap_or(Decimal::ZERO),
            })
            .collect();
        let group_rows = command
            .customer_group_prices
            .iter()
            .map(|p| GroupPriceRow {
                customer_group_id: p.customer_group_id,
                price_type: p.price_type,
                amount: p.amount,
            })
            .collect();

        for associations in [
            ProductAssociations::Categories(category_ids),
            ProductAssociations::Compatible(compatible_ids),
            ProductAssociations::BundleComponents(bundle_rows),
            ProductAssociations::Suppliers(supplier_rows),
            ProductAssociations::CustomerGroupPrices(group_rows),
        ] {
            products.sync_associations(product_id, associations).await?;
        }

        let deleted: HashSet<Uuid> = command.deleted_image_ids.iter().copied().collect();
        let removed_paths: Vec<String> = current_images
            .iter()
            .filter(|img| deleted.contains(&img.id))
            .map(|img| img.path.clone())
            .collect();
        products
            .delete_images(&deleted.iter().copied().collect::<Vec<_>>())
            .await?;

        let mut flagged: Vec<ProductImageModel> = Vec::new();
        for edit in command
            .existing_images
            .iter()
            .filter(|edit| !deleted.contains(&edit.id))
        {
            let Some(image) = owned.get(&edit.id) else {
                continue;
            };
            let mut model = (*image).clone().into_active_model();
            if let Some(alt) = &edit.alt {
                model.alt = Set(Some(alt.clone()));
            }
            if let Some(title) = &edit.title {
                model.title = Set(Some(title.clone()));
            }
            if let Some(caption) = &edit.caption {
                model.caption = Set(Some(caption.clone()));
            }
            if let Some(sort_order) = edit.sort_order {
                model.sort_order = Set(sort_order);
            }
            if let Some(is_primary) = edit.is_primary {
                model.is_primary = Set(is_primary);
            }
            let saved_image = if model.is_changed() {
                products.update_image(model).await?
            } else {
                (*image).clone()
            };
            if edit.is_primary == Some(true) {
                flagged.push(saved_image);
            }
        }

        let base_order = products.max_image_sort_order(product_id).await?.unwrap_or(0);
        for (index, (input, path)) in command.images.iter().zip(staged).enumerate() {
            let offset = i32::try_from(index + 1).unwrap_or(i32::MAX);
            let image = product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                path: Set(path.clone()),
                alt: Set(input.alt.clone()),
                title: Set(input.title.clone()),
                caption: Set(input.caption.clone()),
                sort_order: Set(input
                    .sort_order
                    .unwrap_or_else(|| base_order.saturating_add(offset))),
                is_primary: Set(input.is_primary),
                created_at: Set(Utc::now()),
            };
            let inserted = products.insert_image(image).await?;
            if inserted.is_primary {
                flagged.push(inserted);
            }
        }

        if let Some(winner) = flagged
            .iter()
            .min_by(|a, b| product_image::display_order(a, b))
        {
            products.clear_primary_except(product_id, winner.id).await?;
        }

        let detail = load_detail(&products, saved).await?;
        txn.commit().await?;
        Ok((detail, removed_paths))
    }
}

async fn load_detail<C: ConnectionTrait>(
    products: &ProductRepository<'_, C>,
    product: ProductModel,
) -> Result<ProductDetail, sea_orm::DbErr> {
    let id = product.id;
    Ok(ProductDetail {
        category_ids: products.category_ids(id).await?,
        compatible_product_ids: products.compatible_ids(id).await?,
        bundle_items: products.bundle_lines(id).await?,
        suppliers: products.suppliers(id).await?,
        customer_group_prices: products.group_prices(id).await?,
        images: products.images(id).await?,
        product,
    })
}

async fn count_existing_suppliers<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<u64, sea_orm::DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }
    Supplier::find()
        .filter(supplier::Column::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await
}

async fn count_existing_groups<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<u64, sea_orm::DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }
    CustomerGroup::find()
        .filter(customer_group::Column::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await
}

/// First occurrence of each id, in input order.
fn unique<T: Copy + Eq + Hash>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}

fn has_duplicates<T: Copy + Eq + Hash>(values: impl IntoIterator<Item = T>) -> bool {
    let mut seen = HashSet::new();
    values.into_iter().any(|v| !seen.insert(v))
}

/// Accepts bare base64 or a `data:` URL.
fn decode_image(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = content
        .split_once("base64,")
        .map_or(content, |(_, data)| data);
    BASE64.decode(payload.trim())
}

/// Rules that need no catalog state. Returns the decoded bytes of every new
/// image, in request order.
fn check_request(
    product_id: Uuid,
    command: &UpdateProductCommand,
) -> Result<Vec<Vec<u8>>, ServiceError> {
    let mut errors = FieldErrors::new();

    if command.compatible_products.contains(&product_id) {
        errors.add("compatible_products", "a product cannot be compatible with itself");
    }

    if command.product_type == ProductType::Bundle {
        if command.bundle_items.is_empty() {
            errors.add("bundle_items", "a bundle needs at least one component");
        }
        if command.bundle_items.iter().any(|i| i.product_id == product_id) {
            errors.add("bundle_items", "a bundle cannot contain itself");
        }
        if has_duplicates(command.bundle_items.iter().map(|i| i.product_id)) {
            errors.add("bundle_items", "each component may appear only once");
        }
    }

    if has_duplicates(command.suppliers.iter().map(|s| s.supplier_id)) {
        errors.add("suppliers", "each supplier may appear only once");
    }
    if let Some(default_supplier) = command.default_supplier_id {
        if !command
            .suppliers
            .iter()
            .any(|s| s.supplier_id == default_supplier)
        {
            errors.add(
                "default_supplier_id",
                "must be one of the product's suppliers",
            );
        }
    }

    if has_duplicates(
        command
            .customer_group_prices
            .iter()
            .map(|p| p.customer_group_id),
    ) {
        errors.add(
            "customer_group_prices",
            "each customer group may appear only once",
        );
    }
    for (index, rule) in command.customer_group_prices.iter().enumerate() {
        if rule.price_type == PriceType::Percentage && rule.amount > Decimal::ONE_HUNDRED {
            errors.add(
                format!("customer_group_prices[{}].amount", index),
                "percentage must be between 0 and 100",
            );
        }
    }

    let mut decoded = Vec::with_capacity(command.images.len());
    for (index, image) in command.images.iter().enumerate() {
        match decode_image(&image.content_base64) {
            Ok(bytes) if !bytes.is_empty() => decoded.push(bytes),
            Ok(_) => errors.add(
                format!("images[{}].content_base64", index),
                "image content is empty",
            ),
            Err(_) => errors.add(
                format!("images[{}].content_base64", index),
                "is not valid base64",
            ),
        }
    }

    errors.into_result()?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{BundleItemInput, CustomerGroupPriceInput, SupplierInput};
    use crate::entities::Product;
    use crate::migrator::Migrator;
    use crate::storage::MockImageStorage;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    async fn memory_db() -> Arc<DatabaseConnection> {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(db)
    }

    fn command() -> UpdateProductCommand {
        let create: CreateProductCommand = serde_json::from_value(serde_json::json!({
            "product_type": "standard",
            "name": "Desk Lamp",
            "sku": "LAMP-1",
            "default_category_id": Uuid::new_v4(),
            "categories": [],
            "price": "20.00",
            "gp_percentage": "10"
        }))
        .unwrap();
        create.into()
    }

    fn image(name: &str, content: &str) -> NewImageInput {
        NewImageInput {
            file_name: name.to_string(),
            content_base64: content.to_string(),
            alt: None,
            title: None,
            caption: None,
            sort_order: None,
            is_primary: false,
        }
    }

    #[test]
    fn bundle_rules_are_checked_before_touching_the_database() {
        let id = Uuid::new_v4();
        let component = Uuid::new_v4();
        let mut cmd = command();
        cmd.product_type = ProductType::Bundle;
        cmd.bundle_items = vec![
            BundleItemInput {
                product_id: component,
                quantity: 1,
                price: None,
            },
            BundleItemInput {
                product_id: component,
                quantity: 2,
                price: None,
            },
            BundleItemInput {
                product_id: id,
                quantity: 1,
                price: None,
            },
        ];

        let err = check_request(id, &cmd).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(fields) => {
            assert_eq!(fields.0["bundle_items"].len(), 2);
        });
    }

    #[test]
    fn empty_bundle_is_rejected_but_standard_ignores_components() {
        let mut cmd = command();
        cmd.product_type = ProductType::Bundle;
        assert_matches!(
            check_request(Uuid::new_v4(), &cmd),
            Err(ServiceError::ValidationError(fields)) if fields.contains("bundle_items")
        );

        cmd.product_type = ProductType::Standard;
        cmd.bundle_items = vec![BundleItemInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
            price: None,
        }];
        assert!(check_request(Uuid::new_v4(), &cmd).is_ok());
    }

    #[test]
    fn default_supplier_must_be_listed() {
        let mut cmd = command();
        cmd.suppliers = vec![SupplierInput {
            supplier_id: Uuid::new_v4(),
            price: None,
        }];
        cmd.default_supplier_id = Some(Uuid::new_v4());
        assert_matches!(
            check_request(Uuid::new_v4(), &cmd),
            Err(ServiceError::ValidationError(fields)) if fields.contains("default_supplier_id")
        );
    }

    #[test]
    fn percentage_group_price_is_capped() {
        let mut cmd = command();
        cmd.customer_group_prices = vec![CustomerGroupPriceInput {
            customer_group_id: Uuid::new_v4(),
            price_type: PriceType::Percentage,
            amount: dec!(150),
        }];
        assert_matches!(
            check_request(Uuid::new_v4(), &cmd),
            Err(ServiceError::ValidationError(fields))
                if fields.contains("customer_group_prices[0].amount")
        );
    }

    #[test]
    fn data_urls_and_bare_base64_decode() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_image("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert!(decode_image("not base64!").is_err());
    }

    #[tokio::test]
    async fn bad_base64_never_reaches_storage() {
        let service = ProductService::new(memory_db().await, Arc::new(MockImageStorage::new()));
        let mut cmd = command();
        cmd.images = vec![image("a.png", "aGVsbG8="), image("b.png", "%%%")];

        let err = service.write_product(None, cmd).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(fields) => {
            assert!(fields.contains("images[1].content_base64"));
        });
    }

    #[tokio::test]
    async fn staged_files_are_removed_when_the_transaction_fails() {
        let mut storage = MockImageStorage::new();
        storage
            .expect_store()
            .times(1)
            .returning(|_, path| Ok(path.to_string()));
        storage
            .expect_delete()
            .withf(|path: &str| path.starts_with("products/") && path.ends_with("-lamp.png"))
            .times(1)
            .returning(|_| Ok(true));

        let db = memory_db().await;
        let service = ProductService::new(db.clone(), Arc::new(storage));
        let mut cmd = command();
        cmd.images = vec![image("lamp.png", "aGVsbG8=")];

        // The default category does not exist.
        let err = service.write_product(None, cmd).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(fields) => {
            assert!(fields.contains("default_category_id"));
        });
        assert_eq!(Product::find().count(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn partial_staging_failure_rolls_back_earlier_files() {
        let mut storage = MockImageStorage::new();
        storage.expect_store().times(2).returning(|_, path| {
            if path.ends_with("-broken.png") {
                Err(ServiceError::StorageError("disk full".into()))
            } else {
                Ok(path.to_string())
            }
        });
        storage
            .expect_delete()
            .withf(|path: &str| path.ends_with("-first.png"))
            .times(1)
            .returning(|_| Ok(true));

        let service = ProductService::new(memory_db().await, Arc::new(storage));
        let mut cmd = command();
        cmd.images = vec![
            image("first.png", "aGVsbG8="),
            image("broken.png", "aGVsbG8="),
        ];

        let err = service.write_product(None, cmd).await.unwrap_err();
        assert_matches!(err, ServiceError::StorageError(_));
    }
}
