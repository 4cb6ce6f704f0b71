use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_categories_table::Migration),
            Box::new(m20240601_000002_create_suppliers_and_customer_groups::Migration),
            Box::new(m20240601_000003_create_products_table::Migration),
            Box::new(m20240601_000004_create_product_association_tables::Migration),
        ]
    }
}

mod m20240601_000001_create_categories_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .col(ColumnDef::new(Categories::Slug).string().not_null())
                        .col(ColumnDef::new(Categories::SlugUrl).string().not_null())
                        .col(
                            ColumnDef::new(Categories::Featured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Categories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Categories::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Categories::FeaturedOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Categories::MetaTitle).string().null())
                        .col(ColumnDef::new(Categories::MetaDescription).text().null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_categories_parent_id")
                                .from(Categories::Table, Categories::ParentId)
                                .to(Categories::Table, Categories::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_categories_parent_id")
                        .table(Categories::Table)
                        .col(Categories::ParentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_categories_slug_url")
                        .table(Categories::Table)
                        .col(Categories::SlugUrl)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Categories {
        Table,
        Id,
        ParentId,
        Name,
        Description,
        Slug,
        SlugUrl,
        Featured,
        IsActive,
        SortOrder,
        FeaturedOrder,
        MetaTitle,
        MetaDescription,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_suppliers_and_customer_groups {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_suppliers_and_customer_groups"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Description).text().null())
                        .col(
                            ColumnDef::new(Suppliers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Suppliers::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Suppliers::DutyPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Suppliers::ShippingCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerGroups::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerGroups::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerGroups::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(CustomerGroups::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerGroups::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Suppliers {
        Table,
        Id,
        Name,
        Description,
        IsActive,
        IsDefault,
        DutyPercentage,
        ShippingCost,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum CustomerGroups {
        Table,
        Id,
        Name,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000003_create_products_table {
    use super::m20240601_000001_create_categories_table::Categories;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::ProductType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::ShortDescription)
                                .string_len(500)
                                .null(),
                        )
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::DefaultCategoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::DefaultSupplierId).uuid().null())
                        .col(ColumnDef::new(Products::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Products::Price).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(Products::GpPercentage)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::TotalPrice)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::BundleGpPercentage)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::BundleSubtotal)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::BundleFinalPrice)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Products::RrpCost).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(Products::OverrideRrpCost)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Products::MetaTitle).string().null())
                        .col(
                            ColumnDef::new(Products::MetaDescription)
                                .string_len(500)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_default_category_id")
                                .from(Products::Table, Products::DefaultCategoryId)
                                .to(Categories::Table, Categories::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_default_category_id")
                        .table(Products::Table)
                        .col(Products::DefaultCategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_status")
                        .table(Products::Table)
                        .col(Products::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        ProductType,
        Name,
        Sku,
        Slug,
        ShortDescription,
        Description,
        DefaultCategoryId,
        DefaultSupplierId,
        Status,
        Price,
        GpPercentage,
        TotalPrice,
        BundleGpPercentage,
        BundleSubtotal,
        BundleFinalPrice,
        RrpCost,
        OverrideRrpCost,
        MetaTitle,
        MetaDescription,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_product_association_tables {
    use super::m20240601_000001_create_categories_table::Categories;
    use super::m20240601_000002_create_suppliers_and_customer_groups::{
        CustomerGroups, Suppliers,
    };
    use super::m20240601_000003_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_product_association_tables"
        }
    }

    fn product_fk(name: &str, from: impl IntoTableRef, col: impl IntoIden) -> ForeignKeyCreateStatement {
        ForeignKey::create()
            .name(name)
            .from(from, col)
            .to(Products::Table, Products::Id)
            .on_delete(ForeignKeyAction::Cascade)
            .to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCategories::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCategories::CategoryId)
                                .uuid()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(ProductCategories::ProductId)
                                .col(ProductCategories::CategoryId),
                        )
                        .foreign_key(&mut product_fk(
                            "fk_product_categories_product_id",
                            ProductCategories::Table,
                            ProductCategories::ProductId,
                        ))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_categories_category_id")
                                .from(ProductCategories::Table, ProductCategories::CategoryId)
                                .to(Categories::Table, Categories::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_categories_category_id")
                        .table(ProductCategories::Table)
                        .col(ProductCategories::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CompatibleProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CompatibleProducts::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompatibleProducts::CompatibleProductId)
                                .uuid()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(CompatibleProducts::ProductId)
                                .col(CompatibleProducts::CompatibleProductId),
                        )
                        .foreign_key(&mut product_fk(
                            "fk_compatible_products_product_id",
                            CompatibleProducts::Table,
                            CompatibleProducts::ProductId,
                        ))
                        .foreign_key(&mut product_fk(
                            "fk_compatible_products_compatible_product_id",
                            CompatibleProducts::Table,
                            CompatibleProducts::CompatibleProductId,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductBundles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ProductBundles::BundleId).uuid().not_null())
                        .col(ColumnDef::new(ProductBundles::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductBundles::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(ProductBundles::Price)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .primary_key(
                            Index::create()
                                .col(ProductBundles::BundleId)
                                .col(ProductBundles::ProductId),
                        )
                        .foreign_key(&mut product_fk(
                            "fk_product_bundles_bundle_id",
                            ProductBundles::Table,
                            ProductBundles::BundleId,
                        ))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_bundles_product_id")
                                .from(ProductBundles::Table, ProductBundles::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductSuppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductSuppliers::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductSuppliers::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductSuppliers::Price)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .primary_key(
                            Index::create()
                                .col(ProductSuppliers::ProductId)
                                .col(ProductSuppliers::SupplierId),
                        )
                        .foreign_key(&mut product_fk(
                            "fk_product_suppliers_product_id",
                            ProductSuppliers::Table,
                            ProductSuppliers::ProductId,
                        ))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_suppliers_supplier_id")
                                .from(ProductSuppliers::Table, ProductSuppliers::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductImages::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductImages::Path).string().not_null())
                        .col(ColumnDef::new(ProductImages::Alt).string().null())
                        .col(ColumnDef::new(ProductImages::Title).string().null())
                        .col(ColumnDef::new(ProductImages::Caption).string().null())
                        .col(
                            ColumnDef::new(ProductImages::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductImages::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductImages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(&mut product_fk(
                            "fk_product_images_product_id",
                            ProductImages::Table,
                            ProductImages::ProductId,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_images_product_id")
                        .table(ProductImages::Table)
                        .col(ProductImages::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductCustomerGroupPrices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCustomerGroupPrices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCustomerGroupPrices::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCustomerGroupPrices::CustomerGroupId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCustomerGroupPrices::PriceType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCustomerGroupPrices::Amount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .foreign_key(&mut product_fk(
                            "fk_product_customer_group_prices_product_id",
                            ProductCustomerGroupPrices::Table,
                            ProductCustomerGroupPrices::ProductId,
                        ))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_customer_group_prices_group_id")
                                .from(
                                    ProductCustomerGroupPrices::Table,
                                    ProductCustomerGroupPrices::CustomerGroupId,
                                )
                                .to(CustomerGroups::Table, CustomerGroups::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_customer_group_prices_unique")
                        .table(ProductCustomerGroupPrices::Table)
                        .col(ProductCustomerGroupPrices::ProductId)
                        .col(ProductCustomerGroupPrices::CustomerGroupId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                ProductCustomerGroupPrices::Table.into_iden(),
                ProductImages::Table.into_iden(),
                ProductSuppliers::Table.into_iden(),
                ProductBundles::Table.into_iden(),
                CompatibleProducts::Table.into_iden(),
                ProductCategories::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum ProductCategories {
        Table,
        ProductId,
        CategoryId,
    }

    #[derive(DeriveIden)]
    enum CompatibleProducts {
        Table,
        ProductId,
        CompatibleProductId,
    }

    #[derive(DeriveIden)]
    enum ProductBundles {
        Table,
        BundleId,
        ProductId,
        Quantity,
        Price,
    }

    #[derive(DeriveIden)]
    enum ProductSuppliers {
        Table,
        ProductId,
        SupplierId,
        Price,
    }

    #[derive(DeriveIden)]
    enum ProductImages {
        Table,
        Id,
        ProductId,
        Path,
        Alt,
        Title,
        Caption,
        SortOrder,
        IsPrimary,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductCustomerGroupPrices {
        Table,
        Id,
        ProductId,
        CustomerGroupId,
        PriceType,
        Amount,
    }
}
