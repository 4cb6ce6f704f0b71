mod common;

use assert_matches::assert_matches;
use catalog_api::{
    commands::{
        FeaturedOrderItem, ReorderCategoriesCommand, ReorderFeaturedCategoriesCommand,
        SortOrderItem, UpdateCategoryCommand,
    },
    errors::ServiceError,
    services::CategoryService,
};
use common::{category_command, memory_db, seed_category, seed_product, TestApp};
use uuid::Uuid;

fn update_of(model: &catalog_api::entities::CategoryModel) -> UpdateCategoryCommand {
    UpdateCategoryCommand {
        name: model.name.clone(),
        slug: None,
        parent_id: model.parent_id,
        description: model.description.clone(),
        featured: model.featured,
        is_active: model.is_active,
        meta_title: model.meta_title.clone(),
        meta_description: model.meta_description.clone(),
    }
}

#[tokio::test]
async fn nested_categories_get_materialized_paths() {
    let service = CategoryService::new(memory_db().await);

    let lighting = service
        .create_category(category_command("Lighting", None))
        .await
        .unwrap();
    let lamps = service
        .create_category(category_command("Desk Lamps", Some(lighting.id)))
        .await
        .unwrap();

    assert_eq!(lighting.slug_url, "lighting");
    assert_eq!(lamps.slug, "desk-lamps");
    assert_eq!(lamps.slug_url, "lighting/desk-lamps");
    assert_eq!(lamps.sort_order, lighting.sort_order + 1);
}

#[tokio::test]
async fn sibling_slugs_are_made_unique_but_cousins_may_share() {
    let service = CategoryService::new(memory_db().await);
    let indoor = service.create_category(category_command("Indoor", None)).await.unwrap();
    let outdoor = service.create_category(category_command("Outdoor", None)).await.unwrap();

    let first = service
        .create_category(category_command("Lamps", Some(indoor.id)))
        .await
        .unwrap();
    let second = service
        .create_category(category_command("Lamps!", Some(indoor.id)))
        .await
        .unwrap();
    let cousin = service
        .create_category(category_command("Lamps", Some(outdoor.id)))
        .await
        .unwrap();

    assert_eq!(first.slug, "lamps");
    assert_eq!(second.slug, "lamps-1");
    assert_eq!(cousin.slug, "lamps");
    assert_eq!(cousin.slug_url, "outdoor/lamps");
}

#[tokio::test]
async fn unknown_parent_is_a_validation_error() {
    let service = CategoryService::new(memory_db().await);
    let err = service
        .create_category(category_command("Orphan", Some(Uuid::new_v4())))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("parent_id"));
}

#[tokio::test]
async fn blank_name_fails_validation() {
    let service = CategoryService::new(memory_db().await);
    let err = service
        .create_category(category_command("   ", None))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("name"));
}

#[tokio::test]
async fn moving_a_category_rewrites_descendant_paths() {
    let service = CategoryService::new(memory_db().await);
    let home = service.create_category(category_command("Home", None)).await.unwrap();
    let garden = service.create_category(category_command("Garden", None)).await.unwrap();
    let lighting = service
        .create_category(category_command("Lighting", Some(home.id)))
        .await
        .unwrap();
    let lamps = service
        .create_category(category_command("Lamps", Some(lighting.id)))
        .await
        .unwrap();

    let mut cmd = update_of(&lighting);
    cmd.parent_id = Some(garden.id);
    let moved = service.update_category(lighting.id, cmd).await.unwrap();
    assert_eq!(moved.slug_url, "garden/lighting");

    let lamps = service.get_category(lamps.id).await.unwrap();
    assert_eq!(lamps.slug_url, "garden/lighting/lamps");
}

#[tokio::test]
async fn renaming_regenerates_slug_and_cascades() {
    let service = CategoryService::new(memory_db().await);
    let root = service.create_category(category_command("Lights", None)).await.unwrap();
    let child = service
        .create_category(category_command("Pendants", Some(root.id)))
        .await
        .unwrap();

    let mut cmd = update_of(&root);
    cmd.name = "Lighting & Lamps".into();
    let renamed = service.update_category(root.id, cmd).await.unwrap();

    assert_eq!(renamed.slug, "lighting-and-lamps");
    let child = service.get_category(child.id).await.unwrap();
    assert_eq!(child.slug_url, "lighting-and-lamps/pendants");
}

#[tokio::test]
async fn unchanged_name_keeps_existing_slug() {
    let service = CategoryService::new(memory_db().await);
    let mut create = category_command("Shades", None);
    create.slug = Some("lamp-shades".into());
    let shades = service.create_category(create).await.unwrap();
    assert_eq!(shades.slug, "lamp-shades");

    let mut cmd = update_of(&shades);
    cmd.description = Some("Fabric and glass".into());
    let updated = service.update_category(shades.id, cmd).await.unwrap();
    assert_eq!(updated.slug, "lamp-shades");
    assert_eq!(updated.description.as_deref(), Some("Fabric and glass"));
}

#[tokio::test]
async fn parent_cannot_be_its_own_descendant() {
    let service = CategoryService::new(memory_db().await);
    let a = service.create_category(category_command("A", None)).await.unwrap();
    let b = service
        .create_category(category_command("B", Some(a.id)))
        .await
        .unwrap();
    let c = service
        .create_category(category_command("C", Some(b.id)))
        .await
        .unwrap();

    let mut cmd = update_of(&a);
    cmd.parent_id = Some(c.id);
    let err = service.update_category(a.id, cmd).await.unwrap_err();
    assert_matches!(err, ServiceError::CircularReference(_));

    let mut cmd = update_of(&a);
    cmd.parent_id = Some(a.id);
    let err = service.update_category(a.id, cmd).await.unwrap_err();
    assert_matches!(err, ServiceError::CircularReference(_));

    // Nothing moved.
    let c = service.get_category(c.id).await.unwrap();
    assert_eq!(c.slug_url, "a/b/c");
}

#[tokio::test]
async fn delete_refuses_categories_with_children_or_products() {
    let app = TestApp::new().await;
    let state = &app.state;
    let parent = seed_category(state, "Furniture", None).await;
    let child = seed_category(state, "Chairs", Some(&parent)).await;
    seed_product(state, "Oak Chair", "CH-1", &child, "50", "20").await;

    let err = state.services.categories.delete_category(parent.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("child"));

    let err = state.services.categories.delete_category(child.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("cannot be deleted while 1 products"));

    let empty = seed_category(state, "Empty", None).await;
    state.services.categories.delete_category(empty.id).await.unwrap();
    assert_matches!(
        state.services.categories.get_category(empty.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deactivating_a_category_with_products_conflicts() {
    let app = TestApp::new().await;
    let state = &app.state;
    let category = seed_category(state, "Rugs", None).await;
    seed_product(state, "Wool Rug", "RUG-1", &category, "80", "25").await;

    let err = state
        .services
        .categories
        .set_category_status(category.id, false)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("cannot be deactivated"));

    let mut inactive = update_of(&category);
    inactive.is_active = false;
    let err = state
        .services
        .categories
        .update_category(category.id, inactive)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("cannot be saved as inactive"));

    let bare = seed_category(state, "Mats", None).await;
    let updated = state
        .services
        .categories
        .set_category_status(bare.id, false)
        .await
        .unwrap();
    assert!(!updated.is_active);
}

#[tokio::test]
async fn featured_order_is_assigned_and_reset() {
    let service = CategoryService::new(memory_db().await);
    let mut first = category_command("Sale", None);
    first.featured = true;
    let first = service.create_category(first).await.unwrap();
    let mut second = category_command("New In", None);
    second.featured = true;
    let second = service.create_category(second).await.unwrap();

    assert!(second.featured_order > first.featured_order);

    let mut cmd = update_of(&first);
    cmd.featured = false;
    let unfeatured = service.update_category(first.id, cmd).await.unwrap();
    assert!(!unfeatured.featured);
    assert_eq!(unfeatured.featured_order, 0);
}

#[tokio::test]
async fn reorder_applies_sort_positions() {
    let service = CategoryService::new(memory_db().await);
    let a = service.create_category(category_command("Alpha", None)).await.unwrap();
    let b = service.create_category(category_command("Beta", None)).await.unwrap();

    service
        .reorder_categories(ReorderCategoriesCommand {
            items: vec![
                SortOrderItem { id: a.id, sort_order: 10 },
                SortOrderItem { id: b.id, sort_order: 1 },
            ],
        })
        .await
        .unwrap();

    let tree = service.category_tree().await.unwrap();
    let names: Vec<_> = tree.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Beta", "Alpha"]);
}

#[tokio::test]
async fn reorder_with_unknown_id_changes_nothing() {
    let service = CategoryService::new(memory_db().await);
    let a = service.create_category(category_command("Alpha", None)).await.unwrap();

    let err = service
        .reorder_categories(ReorderCategoriesCommand {
            items: vec![
                SortOrderItem { id: a.id, sort_order: 99 },
                SortOrderItem { id: Uuid::new_v4(), sort_order: 1 },
            ],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
    assert_eq!(service.get_category(a.id).await.unwrap().sort_order, a.sort_order);
}

#[tokio::test]
async fn reorder_featured_rejects_plain_categories() {
    let service = CategoryService::new(memory_db().await);
    let plain = service.create_category(category_command("Plain", None)).await.unwrap();

    let err = service
        .reorder_featured_categories(ReorderFeaturedCategoriesCommand {
            items: vec![FeaturedOrderItem {
                id: plain.id,
                featured_order: 1,
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("items"));
}

#[tokio::test]
async fn admin_tree_includes_inactive_categories() {
    let service = CategoryService::new(memory_db().await);
    let root = service.create_category(category_command("Root", None)).await.unwrap();
    let mut hidden = category_command("Hidden", Some(root.id));
    hidden.is_active = false;
    service.create_category(hidden).await.unwrap();

    let tree = service.category_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 1);
    assert!(!tree[0].children[0].is_active);

    let (items, total) = service.list_categories(Some("hid"), 1, 20).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].name, "Hidden");
}
