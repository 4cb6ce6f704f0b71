//! Public catalog endpoints. No authentication; only active records are
//! visible.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::categories::CategoryResponse;
use super::common::{paginate, success_response};
use super::products::{parse_sort, ImageResponse};
use crate::{
    entities::ProductType,
    errors::ServiceError,
    services::{
        category_tree::CategoryTreeNode, CatalogEntry, ResolvedProduct, StorefrontProduct,
        StorefrontQuery,
    },
    storage::ImageStorage,
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StorefrontProductParams {
    /// Category slug URL, e.g. `lighting/lamps`; includes subcategories
    pub category: Option<String>,
    pub search: Option<String>,
    /// `price_asc`, `price_desc`, `name_asc`, `name_desc` or `newest`
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResolveParams {
    /// Apply this customer group's price rule, if it has one
    pub customer_group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StorefrontProductResponse {
    pub id: Uuid,
    pub product_type: ProductType,
    pub name: String,
    pub sku: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub default_category_id: Uuid,
    pub price: Decimal,
    pub primary_image: Option<ImageResponse>,
}

impl StorefrontProductResponse {
    fn new(item: StorefrontProduct, storage: &dyn ImageStorage) -> Self {
        Self {
            id: item.product.id,
            product_type: item.product.product_type,
            name: item.product.name,
            sku: item.product.sku,
            slug: item.product.slug,
            short_description: item.product.short_description,
            default_category_id: item.product.default_category_id,
            price: item.price,
            primary_image: item
                .primary_image
                .as_ref()
                .map(|img| ImageResponse::new(img, storage)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductPageResponse {
    pub id: Uuid,
    pub product_type: ProductType,
    pub name: String,
    pub sku: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub category: CategoryResponse,
    pub price: Decimal,
    pub customer_group_price: Option<Decimal>,
    pub images: Vec<ImageResponse>,
    pub primary_image_id: Option<Uuid>,
    pub related: Vec<StorefrontProductResponse>,
}

impl ProductPageResponse {
    fn new(resolved: ResolvedProduct, storage: &dyn ImageStorage) -> Self {
        let ResolvedProduct {
            product,
            images,
            primary_image_id,
            default_category,
            price,
            customer_group_price,
            related,
        } = resolved;
        Self {
            id: product.id,
            product_type: product.product_type,
            name: product.name,
            sku: product.sku,
            slug: product.slug,
            short_description: product.short_description,
            description: product.description,
            meta_title: product.meta_title,
            meta_description: product.meta_description,
            category: default_category.into(),
            price,
            customer_group_price,
            images: images
                .iter()
                .map(|img| ImageResponse::new(img, storage))
                .collect(),
            primary_image_id,
            related: related
                .into_iter()
                .map(|item| StorefrontProductResponse::new(item, storage))
                .collect(),
        }
    }
}

/// What a catalog path resolved to
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEntryResponse {
    Category {
        category: CategoryResponse,
        children: Vec<CategoryResponse>,
    },
    Product {
        product: Box<ProductPageResponse>,
    },
}

impl CatalogEntryResponse {
    fn new(entry: CatalogEntry, storage: &dyn ImageStorage) -> Self {
        match entry {
            CatalogEntry::Category { category, children } => Self::Category {
                category: category.into(),
                children: children.into_iter().map(CategoryResponse::from).collect(),
            },
            CatalogEntry::Product(resolved) => Self::Product {
                product: Box::new(ProductPageResponse::new(*resolved, storage)),
            },
        }
    }
}

/// List active products
#[utoipa::path(
    get,
    path = "/api/v1/shop/products",
    summary = "List active products",
    params(StorefrontProductParams),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<StorefrontProductResponse>>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid sort", body = crate::errors::ErrorResponse),
    ),
    tag = "Storefront"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<StorefrontProductParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<StorefrontProductResponse>>>, ServiceError> {
    let storefront = &state.services.storefront;
    let query = StorefrontQuery {
        category: params.category.filter(|c| !c.trim().is_empty()),
        search: params.search,
        sort: parse_sort(params.sort.as_deref())?,
        page: params.page.unwrap_or(1).max(1),
        per_page: params.per_page,
    };
    let limit = storefront.page_size(query.per_page);

    let (items, total) = storefront.products(&query).await?;
    let storage = state.storage.as_ref();
    Ok(success_response(paginate(items, total, query.page, limit, |item| {
        StorefrontProductResponse::new(item, storage)
    })))
}

/// Active product by slug
#[utoipa::path(
    get,
    path = "/api/v1/shop/products/{slug}",
    summary = "Get an active product by slug",
    params(
        ("slug" = String, Path, description = "Product slug"),
        ResolveParams,
    ),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductPageResponse>),
        (status = 404, description = "No active product with this slug", body = crate::errors::ErrorResponse),
    ),
    tag = "Storefront"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ApiResponse<ProductPageResponse>>, ServiceError> {
    let product = state
        .services
        .storefront
        .product_by_slug(&slug, params.customer_group_id)
        .await?;
    Ok(success_response(ProductPageResponse::new(
        product,
        state.storage.as_ref(),
    )))
}

/// Active category tree
#[utoipa::path(
    get,
    path = "/api/v1/shop/categories",
    summary = "Active category tree",
    responses(
        (status = 200, description = "Nested category tree", body = ApiResponse<Vec<CategoryTreeNode>>),
    ),
    tag = "Storefront"
)]
pub async fn category_tree(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeNode>>>, ServiceError> {
    let tree = state.services.storefront.category_tree().await?;
    Ok(success_response(tree))
}

/// Featured categories in featured order
#[utoipa::path(
    get,
    path = "/api/v1/shop/categories/featured",
    summary = "Featured categories",
    responses(
        (status = 200, description = "Featured categories", body = ApiResponse<Vec<CategoryResponse>>),
    ),
    tag = "Storefront"
)]
pub async fn featured_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ServiceError> {
    let categories = state.services.storefront.featured_categories().await?;
    Ok(success_response(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// Resolve a catalog path
#[utoipa::path(
    get,
    path = "/api/v1/shop/resolve/{path}",
    summary = "Resolve a catalog path",
    description = "Looks the path up as a category slug URL first, then as `<category slug URL>/<product slug>`.",
    params(
        ("path" = String, Path, description = "Catalog path, e.g. `lighting/lamps/brass-desk-lamp`"),
        ResolveParams,
    ),
    responses(
        (status = 200, description = "Category or product", body = ApiResponse<CatalogEntryResponse>),
        (status = 404, description = "Nothing at this path", body = crate::errors::ErrorResponse),
    ),
    tag = "Storefront"
)]
pub async fn resolve_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ApiResponse<CatalogEntryResponse>>, ServiceError> {
    let entry = state
        .services
        .storefront
        .resolve(&path, params.customer_group_id)
        .await?;
    Ok(success_response(CatalogEntryResponse::new(
        entry,
        state.storage.as_ref(),
    )))
}

pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:slug", get(get_product))
        .route("/categories", get(category_tree))
        .route("/categories/featured", get(featured_categories))
        .route("/resolve/*path", get(resolve_path))
}
