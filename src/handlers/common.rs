use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::{ApiResponse, PaginatedResponse};

/// 201 with the standard envelope
pub fn created_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// 200 with the standard envelope
pub fn success_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Standard no content response
pub fn no_content_response() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Pagination and search parameters shared by the admin list endpoints
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page; clamped to the configured maximum
    pub limit: Option<u64>,
    /// Case-insensitive substring filter
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Builds the paginated envelope payload from one fetched page
pub fn paginate<T, U>(
    items: Vec<T>,
    total: u64,
    page: u64,
    limit: u64,
    map: impl FnMut(T) -> U,
) -> PaginatedResponse<U> {
    let limit = limit.max(1);
    PaginatedResponse {
        items: items.into_iter().map(map).collect(),
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = paginate(vec![1, 2, 3], 41, 1, 20, |n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.total_pages, 3);

        let empty = paginate(Vec::<u8>::new(), 0, 1, 20, |n| n);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(ListParams::default().page(), 1);
        let params = ListParams {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
    }
}
