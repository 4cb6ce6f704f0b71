use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{default_true, validate_money, validate_not_blank, validate_percentage};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierCommand {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Setting this clears the flag on every other supplier.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    #[validate(custom = "validate_percentage")]
    pub duty_percentage: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_money")]
    pub shipping_cost: Decimal,
}

pub type UpdateSupplierCommand = CreateSupplierCommand;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetSupplierStatusCommand {
    pub is_active: bool,
}
