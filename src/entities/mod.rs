/// Catalog entities
pub mod category;
pub mod compatible_product;
pub mod customer_group;
pub mod customer_group_price;
pub mod product;
pub mod product_bundle;
pub mod product_category;
pub mod product_image;
pub mod product_supplier;
pub mod supplier;

// Re-export entities
pub use category::{Entity as Category, Model as CategoryModel};
pub use compatible_product::Entity as CompatibleProduct;
pub use customer_group::{Entity as CustomerGroup, Model as CustomerGroupModel};
pub use customer_group_price::{
    Entity as CustomerGroupPrice, Model as CustomerGroupPriceModel, PriceType,
};
pub use product::{Entity as Product, Model as ProductModel, ProductStatus, ProductType};
pub use product_bundle::{Entity as ProductBundle, Model as ProductBundleModel};
pub use product_category::Entity as ProductCategory;
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_supplier::{Entity as ProductSupplier, Model as ProductSupplierModel};
pub use supplier::{Entity as Supplier, Model as SupplierModel};
