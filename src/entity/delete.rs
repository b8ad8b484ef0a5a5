//! Contact deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    entity::{EntityId, delete_entity},
    user::UserID,
};

/// The state needed for deleting a contact.
#[derive(Debug, Clone)]
pub struct DeleteEntityState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteEntityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a customer or vendor. Their transactions are kept and show the
/// contact as unknown afterwards.
pub async fn delete_entity_endpoint(
    Path(entity_id): Path<EntityId>,
    State(state): State<DeleteEntityState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_entity(entity_id, user_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Contact deleted".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingEntity) => Error::DeleteMissingEntity.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting contact {entity_id}: {error}");
            error.into_alert_response()
        }
    }
}
