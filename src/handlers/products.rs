use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::{created_response, no_content_response, paginate, success_response};
use crate::{
    commands::{CreateProductCommand, SetProductStatusCommand, UpdateProductCommand},
    entities::{
        product_image, PriceType, ProductImageModel, ProductModel, ProductStatus, ProductType,
    },
    errors::ServiceError,
    repositories::{ProductFilter, ProductSort},
    services::ProductDetail,
    storage::ImageStorage,
    ApiResponse, AppState, PaginatedResponse,
};

/// Flat product row used in listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub product_type: ProductType,
    pub name: String,
    pub sku: String,
    pub slug: String,
    pub status: ProductStatus,
    pub short_description: Option<String>,
    pub default_category_id: Uuid,
    pub price: Option<Decimal>,
    pub gp_percentage: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub bundle_gp_percentage: Option<Decimal>,
    pub bundle_subtotal: Option<Decimal>,
    pub bundle_final_price: Option<Decimal>,
    pub rrp_cost: Option<Decimal>,
    pub override_rrp_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ProductModel> for ProductSummary {
    fn from(p: &ProductModel) -> Self {
        Self {
            id: p.id,
            product_type: p.product_type,
            name: p.name.clone(),
            sku: p.sku.clone(),
            slug: p.slug.clone(),
            status: p.status,
            short_description: p.short_description.clone(),
            default_category_id: p.default_category_id,
            price: p.price,
            gp_percentage: p.gp_percentage,
            total_price: p.total_price,
            bundle_gp_percentage: p.bundle_gp_percentage,
            bundle_subtotal: p.bundle_subtotal,
            bundle_final_price: p.bundle_final_price,
            rrp_cost: p.rrp_cost,
            override_rrp_cost: p.override_rrp_cost,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub url: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub is_primary: bool,
}

impl ImageResponse {
    pub fn new(image: &ProductImageModel, storage: &dyn ImageStorage) -> Self {
        Self {
            id: image.id,
            url: storage.url_for(&image.path),
            alt: image.alt.clone(),
            title: image.title.clone(),
            caption: image.caption.clone(),
            sort_order: image.sort_order,
            is_primary: image.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BundleItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSupplierResponse {
    pub supplier_id: Uuid,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerGroupPriceResponse {
    pub customer_group_id: Uuid,
    pub price_type: PriceType,
    pub amount: Decimal,
}

/// A product with all of its associations
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub description: Option<String>,
    pub default_supplier_id: Option<Uuid>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub categories: Vec<Uuid>,
    pub compatible_products: Vec<Uuid>,
    pub bundle_items: Vec<BundleItemResponse>,
    pub suppliers: Vec<ProductSupplierResponse>,
    pub customer_group_prices: Vec<CustomerGroupPriceResponse>,
    pub images: Vec<ImageResponse>,
    pub primary_image_id: Option<Uuid>,
}

impl ProductResponse {
    pub fn new(detail: ProductDetail, storage: &dyn ImageStorage) -> Self {
        let primary_image_id = product_image::primary_of(&detail.images).map(|img| img.id);
        Self {
            product: ProductSummary::from(&detail.product),
            description: detail.product.description.clone(),
            default_supplier_id: detail.product.default_supplier_id,
            meta_title: detail.product.meta_title.clone(),
            meta_description: detail.product.meta_description.clone(),
            categories: detail.category_ids,
            compatible_products: detail.compatible_product_ids,
            bundle_items: detail
                .bundle_items
                .into_iter()
                .map(|line| BundleItemResponse {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.price,
                })
                .collect(),
            suppliers: detail
                .suppliers
                .into_iter()
                .map(|s| ProductSupplierResponse {
                    supplier_id: s.supplier_id,
                    price: s.price,
                })
                .collect(),
            customer_group_prices: detail
                .customer_group_prices
                .into_iter()
                .map(|p| CustomerGroupPriceResponse {
                    customer_group_id: p.customer_group_id,
                    price_type: p.price_type,
                    amount: p.amount,
                })
                .collect(),
            images: detail
                .images
                .iter()
                .map(|img| ImageResponse::new(img, storage))
                .collect(),
            primary_image_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches name, sku and short description
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub product_type: Option<ProductType>,
    pub category_id: Option<Uuid>,
    /// Only products this supplier supplies
    pub supplier_id: Option<Uuid>,
    /// `price_asc`, `price_desc`, `name_asc`, `name_desc` or `newest`
    pub sort: Option<String>,
}

pub(crate) fn parse_sort(sort: Option<&str>) -> Result<ProductSort, ServiceError> {
    match sort.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ProductSort::default()),
        Some(value) => value.parse().map_err(|_| {
            ServiceError::invalid(
                "sort",
                "must be one of price_asc, price_desc, name_asc, name_desc, newest",
            )
        }),
    }
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    summary = "List products",
    params(ProductListParams),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<ProductSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid sort", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<ProductSummary>>>, ServiceError> {
    let sort = parse_sort(params.sort.as_deref())?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = state.config.page_size(params.limit);
    let filter = ProductFilter {
        search: params.search,
        status: params.status,
        product_type: params.product_type,
        category_ids: params.category_id.map(|id| vec![id]),
        supplier_ids: params.supplier_id.map(|id| vec![id]),
    };

    let (items, total) = state
        .services
        .products
        .list_products(&filter, sort, page, limit)
        .await?;
    Ok(success_response(paginate(items, total, page, limit, |p| {
        ProductSummary::from(&p)
    })))
}

/// Create product
#[utoipa::path(
    post,
    path = "/api/v1/admin/products",
    summary = "Create product",
    description = "Creates a standard or bundle product. Derived prices are computed server side; new images are sent inline as base64.",
    request_body = CreateProductCommand,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductCommand>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    let detail = state.services.products.create_product(payload).await?;
    Ok(created_response(ProductResponse::new(
        detail,
        state.storage.as_ref(),
    )))
}

/// Get product
#[utoipa::path(
    get,
    path = "/api/v1/admin/products/{id}",
    summary = "Get product",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let detail = state.services.products.get_product(id).await?;
    Ok(success_response(ProductResponse::new(
        detail,
        state.storage.as_ref(),
    )))
}

/// Update product
#[utoipa::path(
    put,
    path = "/api/v1/admin/products/{id}",
    summary = "Update product",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductCommand,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product or image not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductCommand>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let detail = state.services.products.update_product(id, payload).await?;
    Ok(success_response(ProductResponse::new(
        detail,
        state.storage.as_ref(),
    )))
}

/// Delete product
#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/{id}",
    summary = "Delete product",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product is a bundle component", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(no_content_response())
}

/// Set product status
#[utoipa::path(
    patch,
    path = "/api/v1/admin/products/{id}/status",
    summary = "Set product status",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = SetProductStatusCommand,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<ProductSummary>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn set_product_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetProductStatusCommand>,
) -> Result<Json<ApiResponse<ProductSummary>>, ServiceError> {
    let product = state
        .services
        .products
        .set_product_status(id, payload.status)
        .await?;
    Ok(success_response(ProductSummary::from(&product)))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/status", patch(set_product_status))
}
