//! Persistence facade over sea-orm.
//!
//! Repositories borrow any [`ConnectionTrait`], so the same methods run on the
//! pooled connection for reads and on an open `DatabaseTransaction` inside a
//! workflow.

use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::ColumnTrait;

pub mod category_repository;
pub mod product_repository;

pub use category_repository::CategoryRepository;
pub use product_repository::{
    BundleComponentRow, GroupPriceRow, ProductAssociations, ProductFilter, ProductRepository,
    ProductSort, SupplierRow,
};

/// Case-insensitive substring match on `column`.
pub(crate) fn contains_ci<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Expr::expr(Func::lower(Expr::col((column.entity_name(), column)))).like(pattern)
}

/// Zero-based page index for a one-based page number.
pub(crate) fn page_index(page: u64) -> u64 {
    page.max(1) - 1
}
