//! Recording sales and purchases, one at a time or in bulk.

mod bulk;
mod form;
mod page;
mod suggestions;

pub use bulk::{create_bulk_entries_endpoint, get_bulk_entry_page, get_bulk_entry_row};
pub use page::{create_entry_endpoint, get_entry_page};
pub use suggestions::{get_entity_suggestions, get_product_suggestions};
