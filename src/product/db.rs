//! Database operations for products.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    product::{Product, ProductId, ProductName},
    search::matches_query,
    user::UserID,
};

/// Initialize the product table.
pub fn create_product_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS product (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Get the product called `name`, creating it if it does not exist yet.
///
/// An existing product whose name differs only in case is reused as is.
pub fn resolve_or_create_product(
    user_id: UserID,
    name: &ProductName,
    connection: &Connection,
) -> Result<Product, Error> {
    let existing = connection
        .prepare(
            "SELECT id, name FROM product
            WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE
            ORDER BY id LIMIT 1",
        )?
        .query_row((user_id.as_i64(), name.as_ref()), map_row)
        .optional()?;

    if let Some(product) = existing {
        return Ok(product);
    }

    connection
        .prepare(
            "INSERT INTO product (user_id, name) VALUES (?1, ?2)
            ON CONFLICT(user_id, name) DO UPDATE SET name = excluded.name
            RETURNING id, name",
        )?
        .query_row((user_id.as_i64(), name.as_ref()), map_row)
        .map_err(Error::from)
}

/// The user's products sorted alphabetically, ignoring case, that contain
/// `query`.
pub fn get_products(
    user_id: UserID,
    query: &str,
    connection: &Connection,
) -> Result<Vec<Product>, Error> {
    let products: Vec<Product> = connection
        .prepare(
            "SELECT id, name FROM product WHERE user_id = :user_id
            ORDER BY name COLLATE NOCASE, id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .collect::<Result<_, _>>()?;

    Ok(products
        .into_iter()
        .filter(|product| matches_query(product.name.as_ref(), query))
        .collect())
}

/// Get one of the user's products.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not exist or belongs to another user.
pub fn get_product(
    id: ProductId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Product, Error> {
    connection
        .prepare("SELECT id, name FROM product WHERE id = ?1 AND user_id = ?2")?
        .query_row((id, user_id.as_i64()), map_row)
        .map_err(Error::from)
}

/// Delete one of the user's products. Transactions that reference it are kept.
///
/// # Errors
///
/// Returns [Error::DeleteMissingProduct] if `id` does not exist or belongs to another user.
pub fn delete_product(
    id: ProductId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM product WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingProduct);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Product, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Product {
        id: row.get(0)?,
        name: ProductName::new_unchecked(&raw_name),
    })
}
