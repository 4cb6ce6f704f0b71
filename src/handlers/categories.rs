use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{created_response, no_content_response, paginate, success_response, ListParams};
use crate::{
    commands::{
        CreateCategoryCommand, ReorderCategoriesCommand, ReorderFeaturedCategoriesCommand,
        SetCategoryStatusCommand, UpdateCategoryCommand,
    },
    entities::CategoryModel,
    errors::ServiceError,
    services::category_tree::CategoryTreeNode,
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub slug_url: String,
    pub featured: bool,
    pub featured_order: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            name: model.name,
            description: model.description,
            slug: model.slug,
            slug_url: model.slug_url,
            featured: model.featured,
            featured_order: model.featured_order,
            is_active: model.is_active,
            sort_order: model.sort_order,
            meta_title: model.meta_title,
            meta_description: model.meta_description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/v1/admin/categories",
    summary = "List categories",
    params(ListParams),
    responses(
        (status = 200, description = "Categories retrieved", body = ApiResponse<PaginatedResponse<CategoryResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<CategoryResponse>>>, ServiceError> {
    let page = params.page();
    let limit = state.config.page_size(params.limit);
    let (items, total) = state
        .services
        .categories
        .list_categories(params.search.as_deref(), page, limit)
        .await?;
    Ok(success_response(paginate(items, total, page, limit, CategoryResponse::from)))
}

/// Full category tree, inactive categories included
#[utoipa::path(
    get,
    path = "/api/v1/admin/categories/tree",
    summary = "Category tree",
    responses(
        (status = 200, description = "Nested category tree", body = ApiResponse<Vec<CategoryTreeNode>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn category_tree(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeNode>>>, ServiceError> {
    let tree = state.services.categories.category_tree().await?;
    Ok(success_response(tree))
}

/// Create category
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    summary = "Create category",
    request_body = CreateCategoryCommand,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryCommand>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ServiceError> {
    let category = state.services.categories.create_category(payload).await?;
    Ok(created_response(category.into()))
}

/// Get category
#[utoipa::path(
    get,
    path = "/api/v1/admin/categories/{id}",
    summary = "Get category",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category retrieved", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ServiceError> {
    let category = state.services.categories.get_category(id).await?;
    Ok(success_response(category.into()))
}

/// Update category
#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/{id}",
    summary = "Update category",
    description = "Replaces the category's fields. Changing the name, slug or parent re-derives the slug URL of the category and of every descendant.",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryCommand,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still in use", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error or circular parent", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryCommand>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ServiceError> {
    let category = state
        .services
        .categories
        .update_category(id, payload)
        .await?;
    Ok(success_response(category.into()))
}

/// Delete category
#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    summary = "Delete category",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category has children or products", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.categories.delete_category(id).await?;
    Ok(no_content_response())
}

/// Activate or deactivate a category
#[utoipa::path(
    patch,
    path = "/api/v1/admin/categories/{id}/status",
    summary = "Set category status",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = SetCategoryStatusCommand,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category has products attached", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn set_category_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetCategoryStatusCommand>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ServiceError> {
    let category = state
        .services
        .categories
        .set_category_status(id, payload.is_active)
        .await?;
    Ok(success_response(category.into()))
}

/// Reorder categories
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories/reorder",
    summary = "Reorder categories",
    request_body = ReorderCategoriesCommand,
    responses(
        (status = 204, description = "Sort order applied"),
        (status = 404, description = "Unknown category id", body = crate::errors::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn reorder_categories(
    State(state): State<AppState>,
    Json(payload): Json<ReorderCategoriesCommand>,
) -> Result<StatusCode, ServiceError> {
    state.services.categories.reorder_categories(payload).await?;
    Ok(no_content_response())
}

/// Reorder featured categories
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories/reorder-featured",
    summary = "Reorder featured categories",
    request_body = ReorderFeaturedCategoriesCommand,
    responses(
        (status = 204, description = "Featured order applied"),
        (status = 404, description = "Unknown category id", body = crate::errors::ErrorResponse),
        (status = 422, description = "Category is not featured", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn reorder_featured_categories(
    State(state): State<AppState>,
    Json(payload): Json<ReorderFeaturedCategoriesCommand>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .categories
        .reorder_featured_categories(payload)
        .await?;
    Ok(no_content_response())
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/tree", get(category_tree))
        .route("/reorder", post(reorder_categories))
        .route("/reorder-featured", post(reorder_featured_categories))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/:id/status", patch(set_category_status))
}
