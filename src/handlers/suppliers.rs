use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{created_response, no_content_response, paginate, success_response, ListParams};
use crate::{
    commands::{CreateSupplierCommand, SetSupplierStatusCommand, UpdateSupplierCommand},
    entities::SupplierModel,
    errors::ServiceError,
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SupplierResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub duty_percentage: Decimal,
    pub shipping_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SupplierModel> for SupplierResponse {
    fn from(model: SupplierModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            is_active: model.is_active,
            is_default: model.is_default,
            duty_percentage: model.duty_percentage,
            shipping_cost: model.shipping_cost,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List suppliers, default supplier first
#[utoipa::path(
    get,
    path = "/api/v1/admin/suppliers",
    summary = "List suppliers",
    params(ListParams),
    responses(
        (status = 200, description = "Suppliers retrieved", body = ApiResponse<PaginatedResponse<SupplierResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<SupplierResponse>>>, ServiceError> {
    let page = params.page();
    let limit = state.config.page_size(params.limit);
    let (items, total) = state
        .services
        .suppliers
        .list_suppliers(params.search.as_deref(), page, limit)
        .await?;
    Ok(success_response(paginate(items, total, page, limit, SupplierResponse::from)))
}

/// Create supplier
#[utoipa::path(
    post,
    path = "/api/v1/admin/suppliers",
    summary = "Create supplier",
    request_body = CreateSupplierCommand,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<SupplierResponse>),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierCommand>,
) -> Result<(StatusCode, Json<ApiResponse<SupplierResponse>>), ServiceError> {
    let supplier = state.services.suppliers.create_supplier(payload).await?;
    Ok(created_response(supplier.into()))
}

/// Get supplier
#[utoipa::path(
    get,
    path = "/api/v1/admin/suppliers/{id}",
    summary = "Get supplier",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier retrieved", body = ApiResponse<SupplierResponse>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state.services.suppliers.get_supplier(id).await?;
    Ok(success_response(supplier.into()))
}

/// Update supplier
#[utoipa::path(
    put,
    path = "/api/v1/admin/suppliers/{id}",
    summary = "Update supplier",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    request_body = UpdateSupplierCommand,
    responses(
        (status = 200, description = "Supplier updated", body = ApiResponse<SupplierResponse>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Supplier in active use", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierCommand>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state.services.suppliers.update_supplier(id, payload).await?;
    Ok(success_response(supplier.into()))
}

/// Delete supplier
#[utoipa::path(
    delete,
    path = "/api/v1/admin/suppliers/{id}",
    summary = "Delete supplier",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Supplier is linked to products", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.suppliers.delete_supplier(id).await?;
    Ok(no_content_response())
}

/// Activate or deactivate a supplier
#[utoipa::path(
    patch,
    path = "/api/v1/admin/suppliers/{id}/status",
    summary = "Set supplier status",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    request_body = SetSupplierStatusCommand,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<SupplierResponse>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Supplier in active use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn set_supplier_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetSupplierStatusCommand>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state
        .services
        .suppliers
        .set_supplier_status(id, payload.is_active)
        .await?;
    Ok(success_response(supplier.into()))
}

/// Make a supplier the default
#[utoipa::path(
    post,
    path = "/api/v1/admin/suppliers/{id}/default",
    summary = "Set default supplier",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Default supplier changed", body = ApiResponse<SupplierResponse>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Supplier is inactive", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn set_default_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state.services.suppliers.set_default_supplier(id).await?;
    Ok(success_response(supplier.into()))
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/:id/status", patch(set_supplier_status))
        .route("/:id/default", post(set_default_supplier))
}
