//! Customers and vendors: the counterparties of the user's sales and purchases.

mod db;
mod delete;
mod domain;
mod ledger;
mod list;

pub use db::{
    create_entity_table, delete_entity, get_entities, get_entities_by_kind, get_entity,
    resolve_or_create_entity,
};
pub use delete::delete_entity_endpoint;
pub use domain::{Entity, EntityId, EntityKind, EntityName};
pub use ledger::get_entity_ledger_page;
pub use list::get_entities_page;
