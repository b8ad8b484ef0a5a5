//! Saving entries in a single database transaction, so that a failure at any
//! step leaves no counterparty, product or transaction row behind.

use rusqlite::Connection;

use crate::{
    Error,
    entity::resolve_or_create_entity,
    product::resolve_or_create_product,
    transaction::{NewEntry, Transaction, core::insert_transaction},
    user::UserID,
};

/// Resolve or create the counterparty and product named by `entry`, then
/// record the transaction. Either everything is saved or nothing is.
pub fn create_transaction_atomic(
    user_id: UserID,
    entry: &NewEntry,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tx = connection.unchecked_transaction()?;

    let transaction = save_entry(user_id, entry, &tx)?;

    tx.commit()?;

    Ok(transaction)
}

/// Save every entry in one database transaction.
///
/// # Errors
///
/// Returns [Error::NoValidBulkEntries] if `entries` is empty. Any other error
/// means none of the entries were saved.
pub fn process_bulk_entries(
    user_id: UserID,
    entries: &[NewEntry],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    if entries.is_empty() {
        return Err(Error::NoValidBulkEntries);
    }

    let tx = connection.unchecked_transaction()?;

    let transactions = entries
        .iter()
        .map(|entry| save_entry(user_id, entry, &tx))
        .collect::<Result<Vec<_>, _>>()?;

    tx.commit()?;

    Ok(transactions)
}

fn save_entry(user_id: UserID, entry: &NewEntry, connection: &Connection) -> Result<Transaction, Error> {
    let entity = resolve_or_create_entity(
        user_id,
        &entry.entity_name,
        entry.kind.counterparty_kind(),
        connection,
    )?;
    let product = resolve_or_create_product(user_id, &entry.product_name, connection)?;

    insert_transaction(
        user_id,
        entry.date,
        entity.id,
        product.id,
        entry.amount,
        entry.kind,
        connection,
    )
}
