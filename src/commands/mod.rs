//! Typed request payloads, one per mutating operation.
//!
//! Field rules are declared with `validator` derive; the few checks that need
//! catalog state (sku uniqueness, referenced ids) live in the services.

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::ValidationError;

use crate::services::pricing::MAX_MONEY;

pub mod categories;
pub mod customer_groups;
pub mod products;
pub mod suppliers;

pub use categories::{
    CreateCategoryCommand, FeaturedOrderItem, ReorderCategoriesCommand,
    ReorderFeaturedCategoriesCommand, SetCategoryStatusCommand, SortOrderItem,
    UpdateCategoryCommand,
};
pub use customer_groups::{
    CreateCustomerGroupCommand, SetCustomerGroupStatusCommand, UpdateCustomerGroupCommand,
};
pub use products::{
    BundleItemInput, CreateProductCommand, CustomerGroupPriceInput, ExistingImageInput,
    NewImageInput, SetProductStatusCommand, SupplierInput, UpdateProductCommand,
};
pub use suppliers::{CreateSupplierCommand, SetSupplierStatusCommand, UpdateSupplierCommand};

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub(crate) fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(rule_error("percentage", "must be between 0 and 100"));
    }
    Ok(())
}

/// Non-negative and within the range of the stored money columns.
pub(crate) fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(rule_error("non_negative", "must not be negative"));
    }
    if *value > MAX_MONEY {
        return Err(rule_error("money_range", "must not exceed 9999999999.99"));
    }
    Ok(())
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "must not be blank"));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}
