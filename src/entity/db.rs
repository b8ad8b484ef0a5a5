//! Database operations for counterparties.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    entity::{Entity, EntityId, EntityKind, EntityName},
    search::matches_query,
    user::UserID,
};

/// Initialize the entity table.
pub fn create_entity_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS entity (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('customer', 'vendor')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, name, kind),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Get the counterparty called `name` of `kind`, creating it if it does not
/// exist yet.
///
/// Names are matched ignoring case, so "ravi stores" resolves to an existing
/// "Ravi Stores" and keeps its spelling. Repeated calls with the same name and
/// kind always return the same record.
pub fn resolve_or_create_entity(
    user_id: UserID,
    name: &EntityName,
    kind: EntityKind,
    connection: &Connection,
) -> Result<Entity, Error> {
    let existing = connection
        .prepare(
            "SELECT id, name, kind FROM entity
            WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE AND kind = ?3
            ORDER BY id LIMIT 1",
        )?
        .query_row((user_id.as_i64(), name.as_ref(), kind), map_row)
        .optional()?;

    if let Some(entity) = existing {
        return Ok(entity);
    }

    connection
        .prepare(
            "INSERT INTO entity (user_id, name, kind) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, name, kind) DO UPDATE SET name = excluded.name
            RETURNING id, name, kind",
        )?
        .query_row((user_id.as_i64(), name.as_ref(), kind), map_row)
        .map_err(Error::from)
}

/// The user's counterparties sorted alphabetically, ignoring case, that
/// contain `query`.
pub fn get_entities(
    user_id: UserID,
    query: &str,
    connection: &Connection,
) -> Result<Vec<Entity>, Error> {
    let entities: Vec<Entity> = connection
        .prepare(
            "SELECT id, name, kind FROM entity WHERE user_id = :user_id
            ORDER BY name COLLATE NOCASE, id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .collect::<Result<_, _>>()?;

    Ok(entities
        .into_iter()
        .filter(|entity| matches_query(entity.name.as_ref(), query))
        .collect())
}

/// The user's counterparties of `kind` sorted alphabetically, ignoring case.
pub fn get_entities_by_kind(
    user_id: UserID,
    kind: EntityKind,
    connection: &Connection,
) -> Result<Vec<Entity>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind FROM entity WHERE user_id = ?1 AND kind = ?2
            ORDER BY name COLLATE NOCASE, id",
        )?
        .query_map((user_id.as_i64(), kind), map_row)?
        .collect::<Result<_, _>>()
        .map_err(Error::from)
}

/// Get one of the user's counterparties.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not exist or belongs to another user.
pub fn get_entity(id: EntityId, user_id: UserID, connection: &Connection) -> Result<Entity, Error> {
    connection
        .prepare("SELECT id, name, kind FROM entity WHERE id = ?1 AND user_id = ?2")?
        .query_row((id, user_id.as_i64()), map_row)
        .map_err(Error::from)
}

/// Delete one of the user's counterparties. Transactions that reference it
/// are kept.
///
/// # Errors
///
/// Returns [Error::DeleteMissingEntity] if `id` does not exist or belongs to another user.
pub fn delete_entity(id: EntityId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM entity WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingEntity);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Entity, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Entity {
        id: row.get(0)?,
        name: EntityName::new_unchecked(&raw_name),
        kind: row.get(2)?,
    })
}

#[cfg(test)]
mod entity_query_tests {
    use crate::{
        Error,
        entity::{EntityKind, EntityName},
        test_utils::{create_test_user, create_user_with_phone, get_test_connection},
    };

    use super::{
        delete_entity, get_entities, get_entities_by_kind, get_entity, resolve_or_create_entity,
    };

    #[test]
    fn resolve_is_idempotent() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        let name = EntityName::new("Ravi Stores").unwrap();

        let first =
            resolve_or_create_entity(user_id, &name, EntityKind::Customer, &connection).unwrap();
        let second =
            resolve_or_create_entity(user_id, &name, EntityKind::Customer, &connection).unwrap();

        assert_eq!(first, second);
        assert_eq!(get_entities(user_id, "", &connection).unwrap().len(), 1);
    }

    #[test]
    fn resolve_reuses_name_typed_in_another_case() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);

        let first = resolve_or_create_entity(
            user_id,
            &EntityName::new_unchecked("Ravi Stores"),
            EntityKind::Customer,
            &connection,
        )
        .unwrap();
        let second = resolve_or_create_entity(
            user_id,
            &EntityName::new_unchecked("ravi stores"),
            EntityKind::Customer,
            &connection,
        )
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.name.to_string(), "Ravi Stores");
        assert_eq!(get_entities(user_id, "", &connection).unwrap().len(), 1);
    }

    #[test]
    fn same_name_different_kind_is_a_different_entity() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        let name = EntityName::new("Ravi Stores").unwrap();

        let customer =
            resolve_or_create_entity(user_id, &name, EntityKind::Customer, &connection).unwrap();
        let vendor =
            resolve_or_create_entity(user_id, &name, EntityKind::Vendor, &connection).unwrap();

        assert_ne!(customer.id, vendor.id);
        assert_eq!(
            get_entities_by_kind(user_id, EntityKind::Vendor, &connection).unwrap(),
            vec![vendor]
        );
    }

    #[test]
    fn lists_alphabetically_ignoring_case() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        for name in ["zeta", "Alpha", "beta"] {
            resolve_or_create_entity(
                user_id,
                &EntityName::new_unchecked(name),
                EntityKind::Customer,
                &connection,
            )
            .unwrap();
        }

        let names: Vec<String> = get_entities(user_id, "", &connection)
            .unwrap()
            .into_iter()
            .map(|entity| entity.name.to_string())
            .collect();

        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn search_filters_by_substring() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        for name in ["Ravi Stores", "Gupta Traders", "Ravindra"] {
            resolve_or_create_entity(
                user_id,
                &EntityName::new_unchecked(name),
                EntityKind::Vendor,
                &connection,
            )
            .unwrap();
        }

        let names: Vec<String> = get_entities(user_id, "RAVI", &connection)
            .unwrap()
            .into_iter()
            .map(|entity| entity.name.to_string())
            .collect();

        assert_eq!(names, vec!["Ravi Stores", "Ravindra"]);
    }

    #[test]
    fn other_users_cannot_see_or_delete() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection);
        let intruder = create_user_with_phone("+919000000000", &connection);
        let entity = resolve_or_create_entity(
            owner,
            &EntityName::new_unchecked("Ravi Stores"),
            EntityKind::Customer,
            &connection,
        )
        .unwrap();

        assert_eq!(get_entity(entity.id, intruder, &connection), Err(Error::NotFound));
        assert!(get_entities(intruder, "", &connection).unwrap().is_empty());
        assert_eq!(
            delete_entity(entity.id, intruder, &connection),
            Err(Error::DeleteMissingEntity)
        );
        assert_eq!(get_entity(entity.id, owner, &connection), Ok(entity));
    }

    #[test]
    fn delete_removes_entity() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        let entity = resolve_or_create_entity(
            user_id,
            &EntityName::new_unchecked("Ravi Stores"),
            EntityKind::Customer,
            &connection,
        )
        .unwrap();

        delete_entity(entity.id, user_id, &connection).unwrap();

        assert_eq!(get_entity(entity.id, user_id, &connection), Err(Error::NotFound));
        assert_eq!(
            delete_entity(entity.id, user_id, &connection),
            Err(Error::DeleteMissingEntity)
        );
    }
}
