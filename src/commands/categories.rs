use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{default_true, validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryCommand {
    #[validate(
        length(min = 1, max = 255, message = "name must be between 1 and 255 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    /// Base text for the slug. Defaults to `name`.
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

/// Full replacement of a category's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryCommand {
    #[validate(
        length(min = 1, max = 255, message = "name must be between 1 and 255 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

impl From<CreateCategoryCommand> for UpdateCategoryCommand {
    fn from(cmd: CreateCategoryCommand) -> Self {
        Self {
            name: cmd.name,
            slug: cmd.slug,
            parent_id: cmd.parent_id,
            description: cmd.description,
            featured: cmd.featured,
            is_active: cmd.is_active,
            meta_title: cmd.meta_title,
            meta_description: cmd.meta_description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetCategoryStatusCommand {
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SortOrderItem {
    pub id: Uuid,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReorderCategoriesCommand {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<SortOrderItem>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct FeaturedOrderItem {
    pub id: Uuid,
    pub featured_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReorderFeaturedCategoriesCommand {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<FeaturedOrderItem>,
}
