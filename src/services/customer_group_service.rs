use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::commands::{CreateCustomerGroupCommand, UpdateCustomerGroupCommand};
use crate::entities::{
    customer_group, customer_group_price, CustomerGroup, CustomerGroupModel, CustomerGroupPrice,
};
use crate::errors::ServiceError;
use crate::repositories::{contains_ci, page_index};

/// Service for managing customer groups. Names are stored trimmed and
/// lowercased and are unique.
#[derive(Clone)]
pub struct CustomerGroupService {
    db: Arc<DatabaseConnection>,
}

impl CustomerGroupService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, command), fields(name = %command.name))]
    pub async fn create_customer_group(
        &self,
        command: CreateCustomerGroupCommand,
    ) -> Result<CustomerGroupModel, ServiceError> {
        command.validate()?;
        let name = command.normalized_name();

        let txn = self.db.begin().await?;
        ensure_name_free(&txn, &name, None).await?;

        let now = Utc::now();
        let saved = customer_group::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            is_active: Set(command.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(customer_group_id = %saved.id, "Customer group created");
        Ok(saved)
    }

    #[instrument(skip(self, command), fields(customer_group_id = %id))]
    pub async fn update_customer_group(
        &self,
        id: Uuid,
        command: UpdateCustomerGroupCommand,
    ) -> Result<CustomerGroupModel, ServiceError> {
        command.validate()?;
        let name = command.normalized_name();

        let txn = self.db.begin().await?;
        let current = get_group(&txn, id).await?;
        ensure_name_free(&txn, &name, Some(id)).await?;

        let mut model = current.into_active_model();
        model.name = Set(name);
        model.is_active = Set(command.is_active);
        model.updated_at = Set(Utc::now());
        let saved = model.update(&txn).await?;
        txn.commit().await?;

        info!(customer_group_id = %id, "Customer group updated");
        Ok(saved)
    }

    /// Deletes the group and every product price defined for it
    #[instrument(skip(self))]
    pub async fn delete_customer_group(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        get_group(&txn, id).await?;

        let prices = CustomerGroupPrice::delete_many()
            .filter(customer_group_price::Column::CustomerGroupId.eq(id))
            .exec(&txn)
            .await?;
        CustomerGroup::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            customer_group_id = %id,
            prices_removed = prices.rows_affected,
            "Customer group deleted"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_customer_group_status(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<CustomerGroupModel, ServiceError> {
        let current = get_group(self.db.as_ref(), id).await?;
        if current.is_active == is_active {
            return Ok(current);
        }

        let mut model = current.into_active_model();
        model.is_active = Set(is_active);
        model.updated_at = Set(Utc::now());
        let saved = model.update(self.db.as_ref()).await?;

        info!(customer_group_id = %id, is_active, "Customer group status changed");
        Ok(saved)
    }

    pub async fn get_customer_group(&self, id: Uuid) -> Result<CustomerGroupModel, ServiceError> {
        get_group(self.db.as_ref(), id).await
    }

    /// Newest first
    pub async fn list_customer_groups(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CustomerGroupModel>, u64), ServiceError> {
        let mut query = CustomerGroup::find();
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(contains_ci(customer_group::Column::Name, term));
        }
        let paginator = query
            .order_by_desc(customer_group::Column::CreatedAt)
            .order_by_asc(customer_group::Column::Name)
            .paginate(self.db.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_index(page)).await?;
        Ok((items, total))
    }
}

async fn get_group<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<CustomerGroupModel, ServiceError> {
    CustomerGroup::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Customer group {} not found", id)))
}

async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = CustomerGroup::find().filter(customer_group::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(customer_group::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(ServiceError::invalid("name", "has already been taken"));
    }
    Ok(())
}
