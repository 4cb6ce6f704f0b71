use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::commands::{CreateSupplierCommand, UpdateSupplierCommand};
use crate::entities::{
    product, product_supplier, supplier, Product, ProductStatus, ProductSupplier, Supplier,
    SupplierModel,
};
use crate::errors::ServiceError;
use crate::repositories::{contains_ci, page_index};

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, command), fields(name = %command.name))]
    pub async fn create_supplier(
        &self,
        command: CreateSupplierCommand,
    ) -> Result<SupplierModel, ServiceError> {
        command.validate()?;

        let txn = self.db.begin().await?;
        let id = Uuid::new_v4();
        if command.is_default {
            clear_default_except(&txn, id).await?;
        }

        let now = Utc::now();
        let saved = supplier::ActiveModel {
            id: Set(id),
            name: Set(command.name.trim().to_string()),
            description: Set(command.description),
            is_active: Set(command.is_active),
            is_default: Set(command.is_default),
            duty_percentage: Set(command.duty_percentage),
            shipping_cost: Set(command.shipping_cost),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(supplier_id = %saved.id, "Supplier created");
        Ok(saved)
    }

    #[instrument(skip(self, command), fields(supplier_id = %id))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        command: UpdateSupplierCommand,
    ) -> Result<SupplierModel, ServiceError> {
        command.validate()?;

        let txn = self.db.begin().await?;
        let current = get_supplier(&txn, id).await?;
        if current.is_active && !command.is_active {
            ensure_not_in_active_use(&txn, id).await?;
        }
        if command.is_default && !current.is_default {
            clear_default_except(&txn, id).await?;
        }

        let mut model = current.into_active_model();
        model.name = Set(command.name.trim().to_string());
        model.description = Set(command.description);
        model.is_active = Set(command.is_active);
        model.is_default = Set(command.is_default);
        model.duty_percentage = Set(command.duty_percentage);
        model.shipping_cost = Set(command.shipping_cost);
        model.updated_at = Set(Utc::now());
        let saved = model.update(&txn).await?;
        txn.commit().await?;

        info!(supplier_id = %id, "Supplier updated");
        Ok(saved)
    }

    /// Deletes a supplier that no product references
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        get_supplier(&txn, id).await?;

        let links = ProductSupplier::find()
            .filter(product_supplier::Column::SupplierId.eq(id))
            .count(&txn)
            .await?;
        if links > 0 {
            return Err(ServiceError::Conflict(format!(
                "supplier {} is linked to {} products",
                id, links
            )));
        }

        Supplier::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_supplier_status(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<SupplierModel, ServiceError> {
        let txn = self.db.begin().await?;
        let current = get_supplier(&txn, id).await?;
        if current.is_active == is_active {
            return Ok(current);
        }
        if !is_active {
            ensure_not_in_active_use(&txn, id).await?;
        }

        let mut model = current.into_active_model();
        model.is_active = Set(is_active);
        model.updated_at = Set(Utc::now());
        let saved = model.update(&txn).await?;
        txn.commit().await?;

        info!(supplier_id = %id, is_active, "Supplier status changed");
        Ok(saved)
    }

    /// Makes `id` the only default supplier
    #[instrument(skip(self))]
    pub async fn set_default_supplier(&self, id: Uuid) -> Result<SupplierModel, ServiceError> {
        let txn = self.db.begin().await?;
        let current = get_supplier(&txn, id).await?;
        if !current.is_active {
            return Err(ServiceError::Conflict(format!(
                "supplier {} is inactive and cannot be the default",
                id
            )));
        }

        clear_default_except(&txn, id).await?;
        let mut model = current.into_active_model();
        model.is_default = Set(true);
        model.updated_at = Set(Utc::now());
        let saved = model.update(&txn).await?;
        txn.commit().await?;

        info!(supplier_id = %id, "Default supplier changed");
        Ok(saved)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<SupplierModel, ServiceError> {
        get_supplier(self.db.as_ref(), id).await
    }

    pub async fn list_suppliers(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<SupplierModel>, u64), ServiceError> {
        let mut query = Supplier::find();
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(contains_ci(supplier::Column::Name, term));
        }
        let paginator = query
            .order_by_desc(supplier::Column::IsDefault)
            .order_by_asc(supplier::Column::Name)
            .paginate(self.db.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_index(page)).await?;
        Ok((items, total))
    }
}

async fn get_supplier<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<SupplierModel, ServiceError> {
    Supplier::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
}

async fn clear_default_except<C: ConnectionTrait>(conn: &C, keep: Uuid) -> Result<(), ServiceError> {
    Supplier::update_many()
        .col_expr(supplier::Column::IsDefault, Expr::value(false))
        .filter(supplier::Column::IsDefault.eq(true))
        .filter(supplier::Column::Id.ne(keep))
        .exec(conn)
        .await?;
    Ok(())
}

/// A supplier is in active use while it is the default supplier of an active
/// product.
async fn ensure_not_in_active_use<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<(), ServiceError> {
    let products = Product::find()
        .filter(product::Column::DefaultSupplierId.eq(id))
        .filter(product::Column::Status.eq(ProductStatus::Active))
        .count(conn)
        .await?;
    if products > 0 {
        return Err(ServiceError::Conflict(format!(
            "supplier {} is the default supplier of {} active products",
            id, products
        )));
    }
    Ok(())
}
