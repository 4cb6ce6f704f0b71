use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{default_true, validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerGroupCommand {
    /// Stored trimmed and lowercased.
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub type UpdateCustomerGroupCommand = CreateCustomerGroupCommand;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetCustomerGroupStatusCommand {
    pub is_active: bool,
}

impl CreateCustomerGroupCommand {
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}
