use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, IntoActiveModel, Set, TransactionTrait};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::commands::{
    CreateCategoryCommand, ReorderCategoriesCommand, ReorderFeaturedCategoriesCommand,
    UpdateCategoryCommand,
};
use crate::entities::{category, CategoryModel};
use crate::errors::ServiceError;
use crate::repositories::CategoryRepository;
use crate::services::category_tree::CategoryTreeNode;
use crate::services::slug;

/// Service for managing the category hierarchy
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a category under an optional parent
    #[instrument(skip(self, command), fields(name = %command.name))]
    pub async fn create_category(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<CategoryModel, ServiceError> {
        command.validate()?;

        let txn = self.db.begin().await?;
        let repo = CategoryRepository::new(&txn);

        let parent = match command.parent_id {
            Some(parent_id) => Some(
                repo.find_category(parent_id)
                    .await?
                    .ok_or_else(|| ServiceError::invalid("parent_id", "parent category does not exist"))?,
            ),
            None => None,
        };

        let taken = repo.sibling_slugs(command.parent_id, None).await?;
        let slug = slug::generate(slug_source(&command.name, command.slug.as_deref()), &taken)?;
        let slug_url = slug::generate_path(&slug, parent.as_ref().map(|p| p.slug_url.as_str()));
        let sort_order = repo.next_sort_order().await?;
        let featured_order = if command.featured {
            repo.next_featured_order().await?
        } else {
            0
        };

        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            parent_id: Set(command.parent_id),
            name: Set(command.name.trim().to_string()),
            description: Set(command.description),
            slug: Set(slug),
            slug_url: Set(slug_url),
            featured: Set(command.featured),
            is_active: Set(command.is_active),
            sort_order: Set(sort_order),
            featured_order: Set(featured_order),
            meta_title: Set(command.meta_title),
            meta_description: Set(command.meta_description),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = repo.save_category(model).await?;
        txn.commit().await?;

        info!(category_id = %saved.id, slug_url = %saved.slug_url, "Category created");
        Ok(saved)
    }

    /// Replaces a category's editable fields, re-deriving its path and the
    /// paths of its whole subtree when the slug or parent changes
    #[instrument(skip(self, command), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: Uuid,
        command: UpdateCategoryCommand,
    ) -> Result<CategoryModel, ServiceError> {
        command.validate()?;

        let txn = self.db.begin().await?;
        let repo = CategoryRepository::new(&txn);
        let current = repo.get_category(id).await?;
        let tree = repo.load_tree().await?;

        let parent = match command.parent_id {
            Some(parent_id) => {
                let parent = tree
                    .get(parent_id)
                    .cloned()
                    .ok_or_else(|| ServiceError::invalid("parent_id", "parent category does not exist"))?;
                if tree.would_create_cycle(id, parent_id)? {
                    return Err(ServiceError::CircularReference(format!(
                        "category {} cannot be placed under its own descendant {}",
                        id, parent_id
                    )));
                }
                Some(parent)
            }
            None => None,
        };

        if current.is_active && !command.is_active {
            ensure_no_products(&repo, id, "saved as inactive").await?;
        }

        let name = command.name.trim().to_string();
        let explicit = explicit_slug(command.slug.as_deref());
        let parent_changed = current.parent_id != command.parent_id;
        let slug_changed = name != current.name
            || explicit.is_some_and(|text| slug::slugify(text) != current.slug);

        let new_slug = if parent_changed || slug_changed {
            let taken = repo.sibling_slugs(command.parent_id, Some(id)).await?;
            slug::generate(slug_source(&name, explicit), &taken)?
        } else {
            current.slug.clone()
        };
        let new_path =
            slug::generate_path(&new_slug, parent.as_ref().map(|p| p.slug_url.as_str()));
        let cascade = if new_path != current.slug_url {
            tree.cascade_paths(id, &new_path)?
        } else {
            Vec::new()
        };

        let featured_order = match (current.featured, command.featured) {
            (false, true) => repo.next_featured_order().await?,
            (_, false) => 0,
            (true, true) => current.featured_order,
        };

        let mut model = current.into_active_model();
        model.parent_id = Set(command.parent_id);
        model.name = Set(name);
        model.description = Set(command.description);
        model.slug = Set(new_slug);
        model.slug_url = Set(new_path);
        model.featured = Set(command.featured);
        model.featured_order = Set(featured_order);
        model.is_active = Set(command.is_active);
        model.meta_title = Set(command.meta_title);
        model.meta_description = Set(command.meta_description);
        model.updated_at = Set(Utc::now());
        let saved = repo.save_category(model).await?;

        for (descendant_id, path) in &cascade {
            repo.update_slug_url(*descendant_id, path).await?;
        }
        txn.commit().await?;

        info!(
            category_id = %saved.id,
            slug_url = %saved.slug_url,
            descendants_updated = cascade.len(),
            "Category updated"
        );
        Ok(saved)
    }

    /// Deletes a leaf category with no products attached
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let repo = CategoryRepository::new(&txn);
        repo.get_category(id).await?;

        let children = repo.count_children(id).await?;
        if children > 0 {
            return Err(ServiceError::Conflict(format!(
                "category {} still has {} child categories",
                id, children
            )));
        }
        ensure_no_products(&repo, id, "deleted").await?;

        repo.delete_category(id).await?;
        txn.commit().await?;

        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Activates or deactivates a category
    #[instrument(skip(self))]
    pub async fn set_category_status(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<CategoryModel, ServiceError> {
        let txn = self.db.begin().await?;
        let repo = CategoryRepository::new(&txn);
        let current = repo.get_category(id).await?;

        if current.is_active == is_active {
            return Ok(current);
        }
        if !is_active {
            ensure_no_products(&repo, id, "deactivated").await?;
        }

        let mut model = current.into_active_model();
        model.is_active = Set(is_active);
        model.updated_at = Set(Utc::now());
        let saved = repo.save_category(model).await?;
        txn.commit().await?;

        info!(category_id = %id, is_active, "Category status changed");
        Ok(saved)
    }

    /// Applies explicit sort positions
    #[instrument(skip(self, command), fields(items = command.items.len()))]
    pub async fn reorder_categories(
        &self,
        command: ReorderCategoriesCommand,
    ) -> Result<(), ServiceError> {
        command.validate()?;

        let txn = self.db.begin().await?;
        let repo = CategoryRepository::new(&txn);
        let ids: Vec<Uuid> = command.items.iter().map(|item| item.id).collect();
        ensure_all_exist(&repo, &ids).await?;

        for item in &command.items {
            repo.set_sort_order(item.id, item.sort_order).await?;
        }
        txn.commit().await?;

        info!(count = command.items.len(), "Categories reordered");
        Ok(())
    }

    /// Applies explicit featured positions; only featured categories qualify
    #[instrument(skip(self, command), fields(items = command.items.len()))]
    pub async fn reorder_featured_categories(
        &self,
        command: ReorderFeaturedCategoriesCommand,
    ) -> Result<(), ServiceError> {
        command.validate()?;

        let txn = self.db.begin().await?;
        let repo = CategoryRepository::new(&txn);
        let ids: Vec<Uuid> = command.items.iter().map(|item| item.id).collect();
        let found = ensure_all_exist(&repo, &ids).await?;

        if let Some(not_featured) = found.iter().find(|c| !c.featured) {
            return Err(ServiceError::invalid(
                "items",
                format!("category {} is not featured", not_featured.id),
            ));
        }

        for item in &command.items {
            repo.set_featured_order(item.id, item.featured_order).await?;
        }
        txn.commit().await?;

        info!(count = command.items.len(), "Featured categories reordered");
        Ok(())
    }

    pub async fn get_category(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        CategoryRepository::new(self.db.as_ref()).get_category(id).await
    }

    /// Flat admin listing, all statuses
    pub async fn list_categories(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CategoryModel>, u64), ServiceError> {
        Ok(CategoryRepository::new(self.db.as_ref())
            .search(search, page, per_page)
            .await?)
    }

    /// Full forest including inactive categories
    pub async fn category_tree(&self) -> Result<Vec<CategoryTreeNode>, ServiceError> {
        let tree = CategoryRepository::new(self.db.as_ref()).load_tree().await?;
        Ok(tree.nested(false))
    }
}

/// Text the slug is derived from: a non-blank explicit slug, else the name.
fn slug_source<'a>(name: &'a str, explicit: Option<&'a str>) -> &'a str {
    explicit_slug(explicit).unwrap_or(name)
}

fn explicit_slug(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

async fn ensure_no_products<C: sea_orm::ConnectionTrait>(
    repo: &CategoryRepository<'_, C>,
    id: Uuid,
    action: &str,
) -> Result<(), ServiceError> {
    let products = repo.count_products_in(id).await?;
    if products > 0 {
        return Err(ServiceError::Conflict(format!(
            "category {} cannot be {} while {} products are attached",
            id, action, products
        )));
    }
    Ok(())
}

async fn ensure_all_exist<C: sea_orm::ConnectionTrait>(
    repo: &CategoryRepository<'_, C>,
    ids: &[Uuid],
) -> Result<Vec<CategoryModel>, ServiceError> {
    let wanted: HashSet<Uuid> = ids.iter().copied().collect();
    let unique: Vec<Uuid> = wanted.iter().copied().collect();
    let found = repo.find_many(&unique).await?;
    if found.len() != wanted.len() {
        let present: HashSet<Uuid> = found.iter().map(|c| c.id).collect();
        let missing: Vec<String> = unique
            .iter()
            .filter(|id| !present.contains(id))
            .map(Uuid::to_string)
            .collect();
        return Err(ServiceError::NotFound(format!(
            "Categories not found: {}",
            missing.join(", ")
        )));
    }
    Ok(found)
}
