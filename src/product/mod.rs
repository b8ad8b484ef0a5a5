//! The user's catalog of products.

mod db;
mod delete;
mod detail;
mod domain;
mod list;

pub use db::{
    create_product_table, delete_product, get_product, get_products, resolve_or_create_product,
};
pub use delete::delete_product_endpoint;
pub use detail::get_product_page;
pub use domain::{Product, ProductId, ProductName};
pub use list::get_products_page;
