use axum::{response::Json, routing::get, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::{categories, customer_groups, health, products, storefront, suppliers};
use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = r#"
# Catalog API

Administration of a product catalog and a public read API over it.

## Authentication

Endpoints under `/api/v1/admin` require a JWT carrying the `admin` role:

```
Authorization: Bearer <your-jwt-token>
```

Endpoints under `/api/v1/shop` are public and only expose active records.

## Errors

Failures share one body. Validation failures list messages per field:

```json
{
  "error": "Unprocessable Entity",
  "message": "Validation error: sku: has already been taken",
  "errors": {"sku": ["has already been taken"]},
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (from 1) and `limit`; responses carry `total` and `total_pages`.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Category hierarchy administration"),
        (name = "Products", description = "Standard and bundle products"),
        (name = "Suppliers", description = "Supplier administration"),
        (name = "Customer Groups", description = "Customer groups for group pricing"),
        (name = "Storefront", description = "Public catalog read API"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Categories
        categories::list_categories,
        categories::category_tree,
        categories::create_category,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        categories::set_category_status,
        categories::reorder_categories,
        categories::reorder_featured_categories,
        // Products
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::set_product_status,
        // Suppliers
        suppliers::list_suppliers,
        suppliers::create_supplier,
        suppliers::get_supplier,
        suppliers::update_supplier,
        suppliers::delete_supplier,
        suppliers::set_supplier_status,
        suppliers::set_default_supplier,
        // Customer groups
        customer_groups::list_customer_groups,
        customer_groups::create_customer_group,
        customer_groups::get_customer_group,
        customer_groups::update_customer_group,
        customer_groups::delete_customer_group,
        customer_groups::set_customer_group_status,
        // Storefront
        storefront::list_products,
        storefront::get_product,
        storefront::category_tree,
        storefront::featured_categories,
        storefront::resolve_path,
        // Health
        health::health_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::errors::FieldErrors,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}

/// Serves the generated document at `/api-docs/openapi.json`
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}
