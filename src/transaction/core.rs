//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    entity::{EntityId, EntityKind, EntityName},
    product::{ProductId, ProductName},
    user::UserID,
};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// Whether the business sold or bought something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Sale,
    Purchase,
}

impl TransactionKind {
    /// The kind of counterparty on the other side of the trade: customers
    /// buy from the business, vendors sell to it.
    pub fn counterparty_kind(&self) -> EntityKind {
        match self {
            TransactionKind::Sale => EntityKind::Customer,
            TransactionKind::Purchase => EntityKind::Vendor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Purchase => "purchase",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "Sale",
            TransactionKind::Purchase => "Purchase",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "Sales",
            TransactionKind::Purchase => "Purchases",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionKind::Sale),
            "purchase" => Ok(TransactionKind::Purchase),
            other => Err(Error::InvalidTransactionKind(other.to_owned())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A finite transaction value greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// Parse an amount typed into a form.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `text` is empty, not a number,
    /// not finite, or not greater than zero.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text = text.trim();
        let invalid = || Error::InvalidAmount(text.to_owned());

        let value: f64 = text.parse().map_err(|_| invalid())?;

        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(invalid())
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// A validated entry ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: Date,
    pub entity_name: EntityName,
    pub product_name: ProductName,
    pub amount: Amount,
    pub kind: TransactionKind,
}

/// A sale or purchase as stored in the database.
///
/// The counterparty and product references are not enforced by the database
/// so that deleting either keeps the transaction history intact.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: Date,
    pub entity_id: Option<EntityId>,
    pub product_id: Option<ProductId>,
    pub value: f64,
    pub kind: TransactionKind,
}

/// Create the transaction table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            entity_id INTEGER,
            product_id INTEGER,
            value REAL NOT NULL CHECK (value > 0),
            kind TEXT NOT NULL CHECK (kind IN ('sale', 'purchase')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Insert a transaction row. Callers are responsible for resolving the
/// counterparty and product first.
pub(super) fn insert_transaction(
    user_id: UserID,
    date: Date,
    entity_id: EntityId,
    product_id: ProductId,
    amount: Amount,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, date, entity_id, product_id, value, kind)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, date, entity_id, product_id, value, kind",
        )?
        .query_row(
            (
                user_id.as_i64(),
                date,
                entity_id,
                product_id,
                amount.as_f64(),
                kind,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Delete one of the user's transactions.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if `id` does not exist or
/// belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        entity_id: row.get(2)?,
        product_id: row.get(3)?,
        value: row.get(4)?,
        kind: row.get(5)?,
    })
}
