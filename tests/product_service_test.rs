mod common;

use assert_matches::assert_matches;
use catalog_api::{
    commands::{CreateProductCommand, CreateSupplierCommand, UpdateProductCommand},
    entities::{PriceType, ProductStatus, ProductType},
    errors::ServiceError,
    repositories::{ProductFilter, ProductSort},
    services::ProductDetail,
};
use common::{png_base64, seed_category, seed_product, standard_product, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

fn bundle_command(name: &str, sku: &str, category: Uuid, items: serde_json::Value) -> CreateProductCommand {
    serde_json::from_value(json!({
        "product_type": "bundle",
        "name": name,
        "sku": sku,
        "default_category_id": category,
        "categories": [category],
        "bundle_items": items,
        "bundle_gp_percentage": "10",
    }))
    .unwrap()
}

#[tokio::test]
async fn standard_product_total_is_derived() {
    let app = TestApp::new().await;
    let category = seed_category(&app.state, "Lamps", None).await;

    let detail = app
        .state
        .services
        .products
        .create_product(standard_product("Desk Lamp", "LAMP-1", category.id, "20.00", "10"))
        .await
        .unwrap();

    let product = &detail.product;
    assert_eq!(product.product_type, ProductType::Standard);
    assert_eq!(product.slug, "desk-lamp");
    assert_eq!(product.total_price, Some(dec!(22.00)));
    assert_eq!(product.bundle_final_price, None);
    assert_eq!(detail.category_ids, vec![category.id]);
}

#[tokio::test]
async fn bundle_prices_from_components_and_line_overrides() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Sets", None).await;
    let lamp = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;
    let bulb = seed_product(&app.state, "Bulb", "B-1", &category, "3", "0").await;

    let detail = products
        .create_product(bundle_command(
            "Reading Kit",
            "KIT-1",
            category.id,
            json!([
                {"product_id": lamp.id, "quantity": 2},
                {"product_id": bulb.id, "quantity": 1, "price": "5"}
            ]),
        ))
        .await
        .unwrap();

    let bundle = &detail.product;
    assert_eq!(bundle.product_type, ProductType::Bundle);
    assert_eq!(bundle.bundle_subtotal, Some(dec!(49.00)));
    assert_eq!(bundle.bundle_final_price, Some(dec!(53.90)));
    assert_eq!(bundle.total_price, None);
    assert_eq!(detail.bundle_items.len(), 2);

    // A bundle component cannot be deleted while the bundle exists.
    let err = products.delete_product(lamp.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn bundles_cannot_contain_bundles() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Sets", None).await;
    let lamp = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;
    let kit = products
        .create_product(bundle_command(
            "Kit",
            "KIT-1",
            category.id,
            json!([{"product_id": lamp.id, "quantity": 1}]),
        ))
        .await
        .unwrap();

    let err = products
        .create_product(bundle_command(
            "Mega Kit",
            "KIT-2",
            category.id,
            json!([{"product_id": kit.product.id, "quantity": 1}]),
        ))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("bundle_items"));
}

#[tokio::test]
async fn duplicate_sku_and_unknown_references_are_reported_together() {
    let app = TestApp::new().await;
    let category = seed_category(&app.state, "Lamps", None).await;
    seed_product(&app.state, "Lamp", "DUP-1", &category, "10", "10").await;

    let mut cmd = standard_product("Other Lamp", "DUP-1", category.id, "10", "10");
    cmd.categories.push(Uuid::new_v4());
    cmd.compatible_products.push(Uuid::new_v4());

    let err = app
        .state
        .services
        .products
        .create_product(cmd)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) => {
        assert!(fields.contains("sku"));
        assert!(fields.contains("categories"));
        assert!(fields.contains("compatible_products"));
    });
}

#[tokio::test]
async fn product_slugs_are_unique_across_the_catalog() {
    let app = TestApp::new().await;
    let a = seed_category(&app.state, "A", None).await;
    let b = seed_category(&app.state, "B", None).await;

    let first = seed_product(&app.state, "Brass Lamp", "BL-1", &a, "10", "10").await;
    let second = seed_product(&app.state, "Brass Lamp", "BL-2", &b, "10", "10").await;

    assert_eq!(first.slug, "brass-lamp");
    assert_eq!(second.slug, "brass-lamp-1");
}

#[tokio::test]
async fn default_supplier_and_group_prices_are_stored() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let category = seed_category(&app.state, "Lamps", None).await;
    let supplier = services
        .suppliers
        .create_supplier(CreateSupplierCommand {
            name: "Acme Lighting".into(),
            description: None,
            is_active: true,
            is_default: true,
            duty_percentage: dec!(5),
            shipping_cost: dec!(12.50),
        })
        .await
        .unwrap();
    let group = services
        .customer_groups
        .create_customer_group(serde_json::from_value(json!({"name": "Trade"})).unwrap())
        .await
        .unwrap();

    let mut cmd = standard_product("Desk Lamp", "LAMP-1", category.id, "20", "10");
    cmd.suppliers = serde_json::from_value(json!([{"supplier_id": supplier.id, "price": "11"}])).unwrap();
    cmd.default_supplier_id = Some(supplier.id);
    cmd.customer_group_prices = serde_json::from_value(json!([
        {"customer_group_id": group.id, "price_type": "percentage", "amount": "15"}
    ]))
    .unwrap();

    let detail = services.products.create_product(cmd).await.unwrap();
    assert_eq!(detail.product.default_supplier_id, Some(supplier.id));
    assert_eq!(detail.suppliers.len(), 1);
    assert_eq!(detail.suppliers[0].price, dec!(11));
    assert_eq!(detail.customer_group_prices.len(), 1);

    // Linked suppliers cannot be deleted; deleting the group drops its prices.
    assert_matches!(
        services.suppliers.delete_supplier(supplier.id).await,
        Err(ServiceError::Conflict(_))
    );
    services
        .customer_groups
        .delete_customer_group(group.id)
        .await
        .unwrap();
    let reloaded = services.products.get_product(detail.product.id).await.unwrap();
    assert!(reloaded.customer_group_prices.is_empty());
}

#[tokio::test]
async fn images_are_stored_primary_is_unique_and_deletes_remove_files() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Lamps", None).await;

    let mut create = standard_product("Desk Lamp", "LAMP-1", category.id, "20", "10");
    create.images = serde_json::from_value(json!([
        {"file_name": "front.png", "content_base64": png_base64(), "is_primary": true},
        {"file_name": "side.png", "content_base64": format!("data:image/png;base64,{}", png_base64())}
    ]))
    .unwrap();
    let detail = products.create_product(create.clone()).await.unwrap();
    assert_eq!(detail.images.len(), 2);
    let front = detail.images.iter().find(|i| i.is_primary).unwrap().clone();
    let side = detail.images.iter().find(|i| !i.is_primary).unwrap().clone();
    assert!(side.sort_order > front.sort_order);
    assert!(app.media.path().join(&front.path).exists());
    assert!(app.media.path().join(&side.path).exists());

    // Promote the side image and drop the front one.
    let mut update: UpdateProductCommand = create.into();
    update.images.clear();
    update.existing_images =
        serde_json::from_value(json!([{"id": side.id, "is_primary": true}])).unwrap();
    update.deleted_image_ids = vec![front.id];
    let detail = products.update_product(detail.product.id, update).await.unwrap();

    assert_eq!(detail.images.len(), 1);
    assert!(detail.images[0].is_primary);
    assert!(!app.media.path().join(&front.path).exists());
    assert!(app.media.path().join(&side.path).exists());

    products.delete_product(detail.product.id).await.unwrap();
    assert!(!app.media.path().join(&side.path).exists());
}

#[tokio::test]
async fn foreign_image_ids_are_not_found() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Lamps", None).await;
    let product = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;

    let mut update: UpdateProductCommand =
        standard_product("Lamp", "L-1", category.id, "20", "10").into();
    update.deleted_image_ids = vec![Uuid::new_v4()];
    let err = products.update_product(product.id, update).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn renaming_a_product_regenerates_its_slug() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Lamps", None).await;
    let product = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;

    let same: UpdateProductCommand = standard_product("Lamp", "L-1", category.id, "25", "10").into();
    let detail = products.update_product(product.id, same).await.unwrap();
    assert_eq!(detail.product.slug, "lamp");
    assert_eq!(detail.product.total_price, Some(dec!(27.50)));

    let renamed: UpdateProductCommand =
        standard_product("Floor Lamp", "L-1", category.id, "25", "10").into();
    let detail = products.update_product(product.id, renamed).await.unwrap();
    assert_eq!(detail.product.slug, "floor-lamp");
}

#[tokio::test]
async fn listing_filters_and_sorts() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let lamps = seed_category(&app.state, "Lamps", None).await;
    let rugs = seed_category(&app.state, "Rugs", None).await;
    seed_product(&app.state, "Cheap Lamp", "L-1", &lamps, "10", "0").await;
    seed_product(&app.state, "Fancy Lamp", "L-2", &lamps, "100", "0").await;
    let rug = seed_product(&app.state, "Rug", "R-1", &rugs, "50", "0").await;
    products
        .set_product_status(rug.id, ProductStatus::Draft)
        .await
        .unwrap();

    let filter = ProductFilter {
        category_ids: Some(vec![lamps.id]),
        ..Default::default()
    };
    let (items, total) = products
        .list_products(&filter, ProductSort::PriceDesc, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(items[0].name, "Fancy Lamp");

    let drafts = ProductFilter {
        status: Some(ProductStatus::Draft),
        ..Default::default()
    };
    let (items, _) = products
        .list_products(&drafts, ProductSort::NameAsc, 1, 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, rug.id);

    let search = ProductFilter {
        search: Some("fancy".into()),
        ..Default::default()
    };
    let (items, _) = products
        .list_products(&search, ProductSort::Newest, 1, 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn component_of_a_bundle_cannot_become_a_bundle() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Sets", None).await;
    let lamp = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;
    let bulb = seed_product(&app.state, "Bulb", "B-1", &category, "3", "0").await;
    let kit = products
        .create_product(bundle_command(
            "Kit",
            "KIT-1",
            category.id,
            json!([{"product_id": lamp.id, "quantity": 1}]),
        ))
        .await
        .unwrap();

    let as_bundle: UpdateProductCommand = bundle_command(
        "Lamp",
        "L-1",
        category.id,
        json!([{"product_id": bulb.id, "quantity": 1}]),
    )
    .into();
    let err = products.update_product(lamp.id, as_bundle).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("product_type"));

    let lamp = products.get_product(lamp.id).await.unwrap();
    assert_eq!(lamp.product.product_type, ProductType::Standard);
    assert!(lamp.bundle_items.is_empty());
    let kit = products.get_product(kit.product.id).await.unwrap();
    assert_eq!(kit.bundle_items.len(), 1);
}

#[tokio::test]
async fn money_beyond_the_column_range_is_rejected() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Sets", None).await;

    let err = products
        .create_product(standard_product(
            "Huge",
            "H-1",
            category.id,
            "70000000000000000000000000000",
            "100",
        ))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("price"));

    // Within range on its own but the margin pushes the total past it.
    let err = products
        .create_product(standard_product("Near", "H-2", category.id, "9999999999.99", "10"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("price"));

    let pricey = seed_product(&app.state, "Pricey", "P-1", &category, "9000000000", "0").await;
    let err = products
        .create_product(bundle_command(
            "Pallet",
            "KIT-1",
            category.id,
            json!([{"product_id": pricey.id, "quantity": 10000}]),
        ))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(fields) if fields.contains("bundle_items"));

    let (_, total) = products
        .list_products(&ProductFilter::default(), ProductSort::Newest, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn update_twice_with_same_payload_is_stable() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let category = seed_category(&app.state, "Sets", None).await;
    let lamp = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;
    let bulb = seed_product(&app.state, "Bulb", "B-1", &category, "3", "0").await;
    let supplier = services
        .suppliers
        .create_supplier(CreateSupplierCommand {
            name: "Acme Lighting".into(),
            description: None,
            is_active: true,
            is_default: false,
            duty_percentage: dec!(0),
            shipping_cost: dec!(0),
        })
        .await
        .unwrap();
    let group = services
        .customer_groups
        .create_customer_group(serde_json::from_value(json!({"name": "Trade"})).unwrap())
        .await
        .unwrap();

    let mut cmd = bundle_command(
        "Reading Kit",
        "KIT-1",
        category.id,
        json!([
            {"product_id": lamp.id, "quantity": 2},
            {"product_id": bulb.id, "quantity": 1, "price": "5"}
        ]),
    );
    cmd.compatible_products = vec![lamp.id];
    cmd.suppliers = serde_json::from_value(json!([{"supplier_id": supplier.id, "price": "30"}])).unwrap();
    cmd.default_supplier_id = Some(supplier.id);
    cmd.customer_group_prices = serde_json::from_value(json!([
        {"customer_group_id": group.id, "price_type": "fixed", "amount": "45"}
    ]))
    .unwrap();
    let created = services.products.create_product(cmd.clone()).await.unwrap();
    let id = created.product.id;

    let first = services
        .products
        .update_product(id, cmd.clone().into())
        .await
        .unwrap();
    let second = services.products.update_product(id, cmd.into()).await.unwrap();

    for detail in [&first, &second] {
        assert_eq!(detail.product.slug, "reading-kit");
        assert_eq!(detail.product.bundle_subtotal, Some(dec!(49.00)));
        assert_eq!(detail.product.bundle_final_price, Some(dec!(53.90)));
        assert_eq!(detail.product.total_price, None);
    }
    assert_eq!(first.product.slug, second.product.slug);
    assert_eq!(first.product.bundle_subtotal, second.product.bundle_subtotal);
    assert_eq!(first.product.bundle_final_price, second.product.bundle_final_price);
    assert_eq!(first.category_ids, second.category_ids);
    assert_eq!(first.compatible_product_ids, second.compatible_product_ids);

    let lines = |detail: &ProductDetail| {
        let mut rows: Vec<_> = detail
            .bundle_items
            .iter()
            .map(|line| (line.product_id, line.quantity, line.price))
            .collect();
        rows.sort();
        rows
    };
    assert_eq!(lines(&first), lines(&second));
    assert_eq!(lines(&second).len(), 2);

    let suppliers = |detail: &ProductDetail| {
        detail
            .suppliers
            .iter()
            .map(|row| (row.supplier_id, row.price))
            .collect::<Vec<_>>()
    };
    assert_eq!(suppliers(&first), suppliers(&second));
    assert_eq!(suppliers(&second), vec![(supplier.id, dec!(30))]);

    let group_prices = |detail: &ProductDetail| {
        detail
            .customer_group_prices
            .iter()
            .map(|row| (row.customer_group_id, row.price_type, row.amount))
            .collect::<Vec<_>>()
    };
    assert_eq!(group_prices(&first), group_prices(&second));
    assert_eq!(
        group_prices(&second),
        vec![(group.id, PriceType::Fixed, dec!(45))]
    );
}

#[tokio::test]
async fn switching_type_clears_the_other_price_columns() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let category = seed_category(&app.state, "Sets", None).await;
    let lamp = seed_product(&app.state, "Lamp", "L-1", &category, "20", "10").await;
    let bulb = seed_product(&app.state, "Bulb", "B-1", &category, "3", "0").await;
    assert_eq!(lamp.total_price, Some(dec!(22.00)));

    let as_bundle: UpdateProductCommand = bundle_command(
        "Lamp",
        "L-1",
        category.id,
        json!([{"product_id": bulb.id, "quantity": 2}]),
    )
    .into();
    products.update_product(lamp.id, as_bundle).await.unwrap();

    let stored = products.get_product(lamp.id).await.unwrap();
    assert_eq!(stored.product.product_type, ProductType::Bundle);
    assert_eq!(stored.product.gp_percentage, None);
    assert_eq!(stored.product.total_price, None);
    assert_eq!(stored.product.bundle_gp_percentage, Some(dec!(10)));
    assert_eq!(stored.product.bundle_subtotal, Some(dec!(6.00)));
    assert_eq!(stored.product.bundle_final_price, Some(dec!(6.60)));
    assert_eq!(stored.bundle_items.len(), 1);

    let as_standard: UpdateProductCommand =
        standard_product("Lamp", "L-1", category.id, "20", "10").into();
    products.update_product(lamp.id, as_standard).await.unwrap();

    let stored = products.get_product(lamp.id).await.unwrap();
    assert_eq!(stored.product.product_type, ProductType::Standard);
    assert_eq!(stored.product.gp_percentage, Some(dec!(10)));
    assert_eq!(stored.product.total_price, Some(dec!(22.00)));
    assert_eq!(stored.product.bundle_gp_percentage, None);
    assert_eq!(stored.product.bundle_subtotal, None);
    assert_eq!(stored.product.bundle_final_price, None);
    assert!(stored.bundle_items.is_empty());
}

#[tokio::test]
async fn listing_filters_by_supplier() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let category = seed_category(&app.state, "Lamps", None).await;
    let mut suppliers = Vec::new();
    for name in ["Acme", "Globex"] {
        let supplier = services
            .suppliers
            .create_supplier(CreateSupplierCommand {
                name: name.into(),
                description: None,
                is_active: true,
                is_default: false,
                duty_percentage: dec!(0),
                shipping_cost: dec!(0),
            })
            .await
            .unwrap();
        suppliers.push(supplier.id);
    }

    let mut supplied = standard_product("Desk Lamp", "L-1", category.id, "20", "10");
    supplied.suppliers =
        serde_json::from_value(json!([{"supplier_id": suppliers[0], "price": "12"}])).unwrap();
    let supplied = services.products.create_product(supplied).await.unwrap();
    seed_product(&app.state, "Floor Lamp", "L-2", &category, "80", "0").await;

    let by_acme = ProductFilter {
        supplier_ids: Some(vec![suppliers[0]]),
        ..Default::default()
    };
    let (items, total) = services
        .products
        .list_products(&by_acme, ProductSort::NameAsc, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].id, supplied.product.id);

    let by_globex = ProductFilter {
        supplier_ids: Some(vec![suppliers[1]]),
        ..Default::default()
    };
    let (_, total) = services
        .products
        .list_products(&by_globex, ProductSort::NameAsc, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 0);
}
