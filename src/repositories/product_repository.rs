use std::collections::HashSet;

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, Query, SimpleExpr},
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::{contains_ci, page_index};
use crate::entities::{
    compatible_product, customer_group_price, product, product_bundle, product_category,
    product_image, product_supplier, CompatibleProduct, CustomerGroupPrice,
    CustomerGroupPriceModel, PriceType, Product, ProductBundle, ProductBundleModel,
    ProductCategory, ProductImage, ProductImageModel, ProductModel, ProductStatus, ProductSupplier,
    ProductSupplierModel, ProductType,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleComponentRow {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplierRow {
    pub supplier_id: Uuid,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupPriceRow {
    pub customer_group_id: Uuid,
    pub price_type: PriceType,
    pub amount: Decimal,
}

/// Full replacement set for one kind of product association.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAssociations {
    Categories(Vec<Uuid>),
    Compatible(Vec<Uuid>),
    BundleComponents(Vec<BundleComponentRow>),
    Suppliers(Vec<SupplierRow>),
    CustomerGroupPrices(Vec<GroupPriceRow>),
}

/// Storefront/admin listing filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub product_type: Option<ProductType>,
    /// Restrict to products attached to any of these categories.
    pub category_ids: Option<Vec<Uuid>>,
    /// Restrict to products any of these suppliers supply.
    pub supplier_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    #[default]
    Newest,
}

pub struct ProductRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ProductRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Option<ProductModel>, DbErr> {
        Product::find_by_id(id).one(self.conn).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        self.find_product(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<ProductModel>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Product::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await
    }

    pub async fn find_product_by_sku(
        &self,
        sku: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<ProductModel>, DbErr> {
        Product::find()
            .filter(product::Column::Sku.eq(sku))
            .filter(exclude(exclude_id))
            .one(self.conn)
            .await
    }

    pub async fn find_product_by_slug(
        &self,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<ProductModel>, DbErr> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(exclude(exclude_id))
            .one(self.conn)
            .await
    }

    /// Product slugs equal to `base` or of the form `base-N`; the only ones
    /// that can collide with a candidate derived from `base`.
    pub async fn slugs_with_base(
        &self,
        base: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<HashSet<String>, DbErr> {
        let slugs: Vec<String> = Product::find()
            .select_only()
            .column(product::Column::Slug)
            .filter(
                Condition::any()
                    .add(product::Column::Slug.eq(base))
                    .add(product::Column::Slug.like(format!("{}-%", base))),
            )
            .filter(exclude(exclude_id))
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(slugs.into_iter().collect())
    }

    /// Inserts new rows (id `Set`) and updates loaded ones (id `Unchanged`).
    pub async fn save_product(&self, model: product::ActiveModel) -> Result<ProductModel, DbErr> {
        match model.id {
            ActiveValue::Unchanged(_) => model.update(self.conn).await,
            _ => model.insert(self.conn).await,
        }
    }

    /// Replaces every row of one association kind for `product_id`.
    pub async fn sync_associations(
        &self,
        product_id: Uuid,
        associations: ProductAssociations,
    ) -> Result<(), DbErr> {
        match associations {
            ProductAssociations::Categories(ids) => {
                ProductCategory::delete_many()
                    .filter(product_category::Column::ProductId.eq(product_id))
                    .exec(self.conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(());
                }
                let rows = ids.into_iter().map(|category_id| product_category::ActiveModel {
                    product_id: Set(product_id),
                    category_id: Set(category_id),
                });
                ProductCategory::insert_many(rows)
                    .exec_without_returning(self.conn)
                    .await?;
            }
            ProductAssociations::Compatible(ids) => {
                CompatibleProduct::delete_many()
                    .filter(compatible_product::Column::ProductId.eq(product_id))
                    .exec(self.conn)
                    .await?;
                if ids.is_empty() {
                    return Ok(());
                }
                let rows = ids
                    .into_iter()
                    .map(|other| compatible_product::ActiveModel {
                        product_id: Set(product_id),
                        compatible_product_id: Set(other),
                    });
                CompatibleProduct::insert_many(rows)
                    .exec_without_returning(self.conn)
                    .await?;
            }
            ProductAssociations::BundleComponents(lines) => {
                ProductBundle::delete_many()
                    .filter(product_bundle::Column::BundleId.eq(product_id))
                    .exec(self.conn)
                    .await?;
                if lines.is_empty() {
                    return Ok(());
                }
                let rows = lines.into_iter().map(|line| product_bundle::ActiveModel {
                    bundle_id: Set(product_id),
                    product_id: Set(line.product_id),
                    quantity: Set(i32::try_from(line.quantity).unwrap_or(i32::MAX)),
                    price: Set(line.price),
                });
                ProductBundle::insert_many(rows)
                    .exec_without_returning(self.conn)
                    .await?;
            }
            ProductAssociations::Suppliers(lines) => {
                ProductSupplier::delete_many()
                    .filter(product_supplier::Column::ProductId.eq(product_id))
                    .exec(self.conn)
                    .await?;
                if lines.is_empty() {
                    return Ok(());
                }
                let rows = lines.into_iter().map(|line| product_supplier::ActiveModel {
                    product_id: Set(product_id),
                    supplier_id: Set(line.supplier_id),
                    price: Set(line.price),
                });
                ProductSupplier::insert_many(rows)
                    .exec_without_returning(self.conn)
                    .await?;
            }
            ProductAssociations::CustomerGroupPrices(lines) => {
                CustomerGroupPrice::delete_many()
                    .filter(customer_group_price::Column::ProductId.eq(product_id))
                    .exec(self.conn)
                    .await?;
                if lines.is_empty() {
                    return Ok(());
                }
                let rows = lines
                    .into_iter()
                    .map(|line| customer_group_price::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        product_id: Set(product_id),
                        customer_group_id: Set(line.customer_group_id),
                        price_type: Set(line.price_type),
                        amount: Set(line.amount),
                    });
                CustomerGroupPrice::insert_many(rows)
                    .exec_without_returning(self.conn)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn category_ids(&self, product_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        ProductCategory::find()
            .select_only()
            .column(product_category::Column::CategoryId)
            .filter(product_category::Column::ProductId.eq(product_id))
            .into_tuple()
            .all(self.conn)
            .await
    }

    pub async fn compatible_ids(&self, product_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        CompatibleProduct::find()
            .select_only()
            .column(compatible_product::Column::CompatibleProductId)
            .filter(compatible_product::Column::ProductId.eq(product_id))
            .into_tuple()
            .all(self.conn)
            .await
    }

    pub async fn bundle_lines(&self, bundle_id: Uuid) -> Result<Vec<ProductBundleModel>, DbErr> {
        ProductBundle::find()
            .filter(product_bundle::Column::BundleId.eq(bundle_id))
            .all(self.conn)
            .await
    }

    /// Number of bundles listing `product_id` as a component.
    pub async fn count_bundles_containing(&self, product_id: Uuid) -> Result<u64, DbErr> {
        ProductBundle::find()
            .filter(product_bundle::Column::ProductId.eq(product_id))
            .count(self.conn)
            .await
    }

    pub async fn suppliers(&self, product_id: Uuid) -> Result<Vec<ProductSupplierModel>, DbErr> {
        ProductSupplier::find()
            .filter(product_supplier::Column::ProductId.eq(product_id))
            .all(self.conn)
            .await
    }

    pub async fn group_prices(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<CustomerGroupPriceModel>, DbErr> {
        CustomerGroupPrice::find()
            .filter(customer_group_price::Column::ProductId.eq(product_id))
            .all(self.conn)
            .await
    }

    pub async fn group_price(
        &self,
        product_id: Uuid,
        customer_group_id: Uuid,
    ) -> Result<Option<CustomerGroupPriceModel>, DbErr> {
        CustomerGroupPrice::find()
            .filter(customer_group_price::Column::ProductId.eq(product_id))
            .filter(customer_group_price::Column::CustomerGroupId.eq(customer_group_id))
            .one(self.conn)
            .await
    }

    /// Images in display order.
    pub async fn images(&self, product_id: Uuid) -> Result<Vec<ProductImageModel>, DbErr> {
        let mut images = ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(self.conn)
            .await?;
        images.sort_by(product_image::display_order);
        Ok(images)
    }

    pub async fn max_image_sort_order(&self, product_id: Uuid) -> Result<Option<i32>, DbErr> {
        let max: Option<Option<i32>> = ProductImage::find()
            .select_only()
            .column_as(product_image::Column::SortOrder.max(), "max_sort_order")
            .filter(product_image::Column::ProductId.eq(product_id))
            .into_tuple()
            .one(self.conn)
            .await?;
        Ok(max.flatten())
    }

    pub async fn insert_image(
        &self,
        image: product_image::ActiveModel,
    ) -> Result<ProductImageModel, DbErr> {
        image.insert(self.conn).await
    }

    pub async fn update_image(
        &self,
        image: product_image::ActiveModel,
    ) -> Result<ProductImageModel, DbErr> {
        image.update(self.conn).await
    }

    pub async fn delete_images(&self, ids: &[Uuid]) -> Result<(), DbErr> {
        if ids.is_empty() {
            return Ok(());
        }
        ProductImage::delete_many()
            .filter(product_image::Column::Id.is_in(ids.iter().copied()))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Drops the primary flag from every image of the product except `keep`.
    pub async fn clear_primary_except(&self, product_id: Uuid, keep: Uuid) -> Result<(), DbErr> {
        ProductImage::update_many()
            .col_expr(product_image::Column::IsPrimary, Expr::value(false))
            .filter(product_image::Column::ProductId.eq(product_id))
            .filter(product_image::Column::Id.ne(keep))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Removes the product and every row that refers to it, including
    /// compatibility links pointing at it from other products.
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), DbErr> {
        for kind in [
            ProductAssociations::Categories(Vec::new()),
            ProductAssociations::Compatible(Vec::new()),
            ProductAssociations::BundleComponents(Vec::new()),
            ProductAssociations::Suppliers(Vec::new()),
            ProductAssociations::CustomerGroupPrices(Vec::new()),
        ] {
            self.sync_associations(product_id, kind).await?;
        }
        CompatibleProduct::delete_many()
            .filter(compatible_product::Column::CompatibleProductId.eq(product_id))
            .exec(self.conn)
            .await?;
        ProductImage::delete_many()
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(self.conn)
            .await?;
        Product::delete_by_id(product_id).exec(self.conn).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductModel>, u64), DbErr> {
        let paginator = sorted(filtered(filter), sort).paginate(self.conn, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_index(page)).await?;
        Ok((items, total))
    }

    /// Other active products with the same default category, newest first.
    pub async fn related(
        &self,
        product: &ProductModel,
        limit: u64,
    ) -> Result<Vec<ProductModel>, DbErr> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Product::find()
            .filter(product::Column::DefaultCategoryId.eq(product.default_category_id))
            .filter(product::Column::Id.ne(product.id))
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .order_by_desc(product::Column::CreatedAt)
            .limit(limit)
            .all(self.conn)
            .await
    }
}

fn exclude(exclude_id: Option<Uuid>) -> Condition {
    match exclude_id {
        Some(id) => Condition::all().add(product::Column::Id.ne(id)),
        None => Condition::all(),
    }
}

fn filtered(filter: &ProductFilter) -> Select<Product> {
    let mut query = Product::find();
    if let Some(status) = filter.status {
        query = query.filter(product::Column::Status.eq(status));
    }
    if let Some(product_type) = filter.product_type {
        query = query.filter(product::Column::ProductType.eq(product_type));
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
        query = query.filter(
            Condition::any()
                .add(contains_ci(product::Column::Name, term))
                .add(contains_ci(product::Column::Sku, term))
                .add(contains_ci(product::Column::ShortDescription, term)),
        );
    }
    if let Some(category_ids) = &filter.category_ids {
        query = query.filter(
            product::Column::Id.in_subquery(
                Query::select()
                    .column(product_category::Column::ProductId)
                    .from(ProductCategory)
                    .and_where(
                        product_category::Column::CategoryId.is_in(category_ids.iter().copied()),
                    )
                    .to_owned(),
            ),
        );
    }
    if let Some(supplier_ids) = &filter.supplier_ids {
        query = query.filter(
            product::Column::Id.in_subquery(
                Query::select()
                    .column(product_supplier::Column::ProductId)
                    .from(ProductSupplier)
                    .and_where(
                        product_supplier::Column::SupplierId.is_in(supplier_ids.iter().copied()),
                    )
                    .to_owned(),
            ),
        );
    }
    query
}

fn sell_price_expr() -> SimpleExpr {
    Func::coalesce([
        Expr::col((Product, product::Column::TotalPrice)).into(),
        Expr::col((Product, product::Column::BundleFinalPrice)).into(),
    ])
    .into()
}

fn sorted(query: Select<Product>, sort: ProductSort) -> Select<Product> {
    match sort {
        ProductSort::PriceAsc => query
            .order_by(sell_price_expr(), Order::Asc)
            .order_by_asc(product::Column::Name),
        ProductSort::PriceDesc => query
            .order_by(sell_price_expr(), Order::Desc)
            .order_by_asc(product::Column::Name),
        ProductSort::NameAsc => query.order_by_asc(product::Column::Name),
        ProductSort::NameDesc => query.order_by_desc(product::Column::Name),
        ProductSort::Newest => query
            .order_by_desc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id),
    }
}
