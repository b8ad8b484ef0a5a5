//! Code for creating the user table and finding or creating users from a
//! verified external identity.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// A user signs in either with a verified phone number or with an account at
/// the OAuth identity provider, so at least one of `phone_number` and
/// `oauth_subject` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The verified phone number, including the country prefix.
    pub phone_number: Option<String>,
    /// The identity provider's stable identifier for the user.
    pub oauth_subject: Option<String>,
    /// The email address reported by the identity provider.
    pub email: Option<String>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                phone_number TEXT UNIQUE,
                oauth_subject TEXT UNIQUE,
                email TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );",
    )?;

    Ok(())
}

/// Get the user signed in with `phone_number`, creating them if this is the
/// first time the number has been seen.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn find_or_create_user_by_phone(
    phone_number: &str,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (phone_number) VALUES (?1)
            ON CONFLICT(phone_number) DO UPDATE SET phone_number = excluded.phone_number
            RETURNING id, phone_number, oauth_subject, email",
        )?
        .query_row((phone_number,), map_row)
        .map_err(|error| error.into())
}

/// Get the user with the identity provider subject `subject`, creating them
/// if this is their first sign in.
///
/// The stored email is updated when the provider reports one.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn find_or_create_user_by_subject(
    subject: &str,
    email: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (oauth_subject, email) VALUES (?1, ?2)
            ON CONFLICT(oauth_subject) DO UPDATE SET email = COALESCE(excluded.email, email)
            RETURNING id, phone_number, oauth_subject, email",
        )?
        .query_row((subject, email), map_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, phone_number, oauth_subject, email FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserID::new(row.get(0)?),
        phone_number: row.get(1)?,
        oauth_subject: row.get(2)?,
        email: row.get(3)?,
    })
}
