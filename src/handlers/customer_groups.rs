use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{created_response, no_content_response, paginate, success_response, ListParams};
use crate::{
    commands::{
        CreateCustomerGroupCommand, SetCustomerGroupStatusCommand, UpdateCustomerGroupCommand,
    },
    entities::CustomerGroupModel,
    errors::ServiceError,
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerGroupResponse {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerGroupModel> for CustomerGroupResponse {
    fn from(model: CustomerGroupModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List customer groups
#[utoipa::path(
    get,
    path = "/api/v1/admin/customer-groups",
    summary = "List customer groups",
    params(ListParams),
    responses(
        (status = 200, description = "Customer groups retrieved", body = ApiResponse<PaginatedResponse<CustomerGroupResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customer Groups"
)]
pub async fn list_customer_groups(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<CustomerGroupResponse>>>, ServiceError> {
    let page = params.page();
    let limit = state.config.page_size(params.limit);
    let (items, total) = state
        .services
        .customer_groups
        .list_customer_groups(params.search.as_deref(), page, limit)
        .await?;
    Ok(success_response(paginate(
        items,
        total,
        page,
        limit,
        CustomerGroupResponse::from,
    )))
}

/// Create customer group
#[utoipa::path(
    post,
    path = "/api/v1/admin/customer-groups",
    summary = "Create customer group",
    request_body = CreateCustomerGroupCommand,
    responses(
        (status = 201, description = "Customer group created", body = ApiResponse<CustomerGroupResponse>),
        (status = 422, description = "Validation error or duplicate name", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customer Groups"
)]
pub async fn create_customer_group(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerGroupCommand>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerGroupResponse>>), ServiceError> {
    let group = state
        .services
        .customer_groups
        .create_customer_group(payload)
        .await?;
    Ok(created_response(group.into()))
}

/// Get customer group
#[utoipa::path(
    get,
    path = "/api/v1/admin/customer-groups/{id}",
    summary = "Get customer group",
    params(("id" = Uuid, Path, description = "Customer group ID")),
    responses(
        (status = 200, description = "Customer group retrieved", body = ApiResponse<CustomerGroupResponse>),
        (status = 404, description = "Customer group not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customer Groups"
)]
pub async fn get_customer_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerGroupResponse>>, ServiceError> {
    let group = state.services.customer_groups.get_customer_group(id).await?;
    Ok(success_response(group.into()))
}

/// Update customer group
#[utoipa::path(
    put,
    path = "/api/v1/admin/customer-groups/{id}",
    summary = "Update customer group",
    params(("id" = Uuid, Path, description = "Customer group ID")),
    request_body = UpdateCustomerGroupCommand,
    responses(
        (status = 200, description = "Customer group updated", body = ApiResponse<CustomerGroupResponse>),
        (status = 404, description = "Customer group not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error or duplicate name", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customer Groups"
)]
pub async fn update_customer_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerGroupCommand>,
) -> Result<Json<ApiResponse<CustomerGroupResponse>>, ServiceError> {
    let group = state
        .services
        .customer_groups
        .update_customer_group(id, payload)
        .await?;
    Ok(success_response(group.into()))
}

/// Delete customer group and its product prices
#[utoipa::path(
    delete,
    path = "/api/v1/admin/customer-groups/{id}",
    summary = "Delete customer group",
    params(("id" = Uuid, Path, description = "Customer group ID")),
    responses(
        (status = 204, description = "Customer group deleted"),
        (status = 404, description = "Customer group not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customer Groups"
)]
pub async fn delete_customer_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .customer_groups
        .delete_customer_group(id)
        .await?;
    Ok(no_content_response())
}

/// Activate or deactivate a customer group
#[utoipa::path(
    patch,
    path = "/api/v1/admin/customer-groups/{id}/status",
    summary = "Set customer group status",
    params(("id" = Uuid, Path, description = "Customer group ID")),
    request_body = SetCustomerGroupStatusCommand,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<CustomerGroupResponse>),
        (status = 404, description = "Customer group not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customer Groups"
)]
pub async fn set_customer_group_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetCustomerGroupStatusCommand>,
) -> Result<Json<ApiResponse<CustomerGroupResponse>>, ServiceError> {
    let group = state
        .services
        .customer_groups
        .set_customer_group_status(id, payload.is_active)
        .await?;
    Ok(success_response(group.into()))
}

pub fn customer_group_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customer_groups).post(create_customer_group))
        .route(
            "/:id",
            get(get_customer_group)
                .put(update_customer_group)
                .delete(delete_customer_group),
        )
        .route("/:id/status", patch(set_customer_group_status))
}
