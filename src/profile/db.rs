//! Database operations for business profiles.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    profile::{CompanyName, Profile},
    user::UserID,
};

/// Initialize the profile table.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS profile (
            user_id INTEGER PRIMARY KEY,
            company_name TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Create the profile for `user_id`.
///
/// # Errors
///
/// Returns an [Error::ProfileAlreadyExists] if the user already has a profile.
pub fn create_profile(
    user_id: UserID,
    company_name: CompanyName,
    connection: &Connection,
) -> Result<Profile, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO profile (user_id, company_name) VALUES (?1, ?2)
        ON CONFLICT(user_id) DO NOTHING",
        (user_id.as_i64(), company_name.as_ref()),
    )?;

    if rows_affected == 0 {
        return Err(Error::ProfileAlreadyExists);
    }

    Ok(Profile {
        user_id,
        company_name,
    })
}

/// The profile for `user_id`, or `None` if they have not been onboarded.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Option<Profile>, Error> {
    connection
        .prepare("SELECT user_id, company_name FROM profile WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Whether `user_id` has completed onboarding.
pub fn has_profile(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    get_profile(user_id, connection).map(|profile| profile.is_some())
}

fn map_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    let user_id = UserID::new(row.get(0)?);
    let raw_name: String = row.get(1)?;

    Ok(Profile {
        user_id,
        company_name: CompanyName::new_unchecked(&raw_name),
    })
}
