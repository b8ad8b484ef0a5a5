//! Creates the application's database schema.

use rusqlite::{Connection, TransactionBehavior, Transaction as SqlTransaction};

use crate::{
    Error, entity::create_entity_table, product::create_product_table,
    profile::create_profile_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the application tables if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection` since it is off
/// by default in SQLite.
///
/// # Errors
/// Returns an error if there is an SQL error while creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_entity_table(&transaction)?;
    create_product_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
