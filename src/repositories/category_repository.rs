use std::collections::HashSet;

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::{contains_ci, page_index};
use crate::entities::{category, product_category, Category, CategoryModel, ProductCategory};
use crate::errors::ServiceError;
use crate::services::category_tree::CategoryTree;

pub struct CategoryRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CategoryRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<CategoryModel>, DbErr> {
        Category::find_by_id(id).one(self.conn).await
    }

    /// Like [`Self::find_category`] but missing rows become `NotFound`.
    pub async fn get_category(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        self.find_category(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn find_category_by_slug_scope(
        &self,
        slug: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Option<CategoryModel>, DbErr> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(parent_condition(parent_id))
            .one(self.conn)
            .await
    }

    pub async fn find_by_slug_url(&self, slug_url: &str) -> Result<Option<CategoryModel>, DbErr> {
        Category::find()
            .filter(category::Column::SlugUrl.eq(slug_url))
            .one(self.conn)
            .await
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<CategoryModel>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Category::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await
    }

    /// Slugs already used under `parent_id`, minus the category being edited.
    pub async fn sibling_slugs(
        &self,
        parent_id: Option<Uuid>,
        exclude_id: Option<Uuid>,
    ) -> Result<HashSet<String>, DbErr> {
        let mut query = Category::find()
            .select_only()
            .column(category::Column::Slug)
            .filter(parent_condition(parent_id));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(category::Column::Id.ne(exclude_id));
        }
        let slugs: Vec<String> = query.into_tuple().all(self.conn).await?;
        Ok(slugs.into_iter().collect())
    }

    pub async fn list_children(&self, category_id: Uuid) -> Result<Vec<CategoryModel>, DbErr> {
        Category::find()
            .filter(category::Column::ParentId.eq(category_id))
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(self.conn)
            .await
    }

    pub async fn count_children(&self, category_id: Uuid) -> Result<u64, DbErr> {
        Category::find()
            .filter(category::Column::ParentId.eq(category_id))
            .count(self.conn)
            .await
    }

    pub async fn count_products_in(&self, category_id: Uuid) -> Result<u64, DbErr> {
        ProductCategory::find()
            .filter(product_category::Column::CategoryId.eq(category_id))
            .count(self.conn)
            .await
    }

    pub async fn load_tree(&self) -> Result<CategoryTree, DbErr> {
        let all = Category::find().all(self.conn).await?;
        Ok(CategoryTree::new(all))
    }

    /// `max(sort_order) + 1` over all categories.
    pub async fn next_sort_order(&self) -> Result<i32, DbErr> {
        let max: Option<Option<i32>> = Category::find()
            .select_only()
            .column_as(category::Column::SortOrder.max(), "max_sort_order")
            .into_tuple()
            .one(self.conn)
            .await?;
        Ok(max.flatten().unwrap_or(0) + 1)
    }

    /// `max(featured_order) + 1` over featured categories.
    pub async fn next_featured_order(&self) -> Result<i32, DbErr> {
        let max: Option<Option<i32>> = Category::find()
            .select_only()
            .column_as(category::Column::FeaturedOrder.max(), "max_featured_order")
            .filter(category::Column::Featured.eq(true))
            .into_tuple()
            .one(self.conn)
            .await?;
        Ok(max.flatten().unwrap_or(0) + 1)
    }

    /// Inserts new rows (id `Set`) and updates loaded ones (id `Unchanged`).
    pub async fn save_category(
        &self,
        model: category::ActiveModel,
    ) -> Result<CategoryModel, DbErr> {
        match model.id {
            ActiveValue::Unchanged(_) => model.update(self.conn).await,
            _ => model.insert(self.conn).await,
        }
    }

    pub async fn update_slug_url(&self, id: Uuid, slug_url: &str) -> Result<(), DbErr> {
        Category::update_many()
            .col_expr(category::Column::SlugUrl, Expr::value(slug_url))
            .col_expr(category::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(category::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<(), DbErr> {
        Category::update_many()
            .col_expr(category::Column::SortOrder, Expr::value(sort_order))
            .filter(category::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_featured_order(&self, id: Uuid, featured_order: i32) -> Result<(), DbErr> {
        Category::update_many()
            .col_expr(category::Column::FeaturedOrder, Expr::value(featured_order))
            .filter(category::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), DbErr> {
        Category::delete_by_id(id).exec(self.conn).await?;
        Ok(())
    }

    /// Admin listing: optional name/slug search, ordered like the tree.
    pub async fn search(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CategoryModel>, u64), DbErr> {
        let mut query = Category::find();
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(category::Column::Name, term))
                    .add(contains_ci(category::Column::SlugUrl, term)),
            );
        }
        let paginator = query
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .paginate(self.conn, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_index(page)).await?;
        Ok((items, total))
    }

    pub async fn featured(&self, active_only: bool) -> Result<Vec<CategoryModel>, DbErr> {
        let mut query = Category::find().filter(category::Column::Featured.eq(true));
        if active_only {
            query = query.filter(category::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(category::Column::FeaturedOrder)
            .order_by_asc(category::Column::Name)
            .all(self.conn)
            .await
    }
}

fn parent_condition(parent_id: Option<Uuid>) -> Condition {
    match parent_id {
        Some(id) => Condition::all().add(category::Column::ParentId.eq(id)),
        None => Condition::all().add(category::Column::ParentId.is_null()),
    }
}
