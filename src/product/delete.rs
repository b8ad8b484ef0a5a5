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
    product::{ProductId, delete_product},
    user::UserID,
};

#[derive(Debug, Clone)]
pub struct DeleteProductState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteProductState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Remove a product from the catalog. Its transactions stay in the reports
/// under an unknown product.
pub async fn delete_product_endpoint(
    Path(product_id): Path<ProductId>,
    State(state): State<DeleteProductState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_product(product_id, user_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Product deleted".to_owned(),
        }
        .into_response(),
        Err(error) => {
            if error != Error::DeleteMissingProduct {
                tracing::error!("Could not delete product {product_id}: {error}");
            }
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_product_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        entity::EntityName,
        product::{ProductName, get_products},
        test_utils::{create_test_user, get_test_connection},
        transaction::{Amount, NewEntry, TransactionKind, create_transaction_atomic},
    };

    use super::{DeleteProductState, delete_product_endpoint};

    #[tokio::test]
    async fn deletes_product_and_keeps_transactions() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        let transaction = create_transaction_atomic(
            user_id,
            &NewEntry {
                date: date!(2025 - 01 - 10),
                entity_name: EntityName::new_unchecked("Ravi Stores"),
                product_name: ProductName::new_unchecked("Sugar"),
                amount: Amount::parse("45").unwrap(),
                kind: TransactionKind::Sale,
            },
            &connection,
        )
        .unwrap();
        let product_id = transaction.product_id.unwrap();
        let state = DeleteProductState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_product_endpoint(Path(product_id), State(state.clone()), Extension(user_id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_products(user_id, "", &connection).unwrap().is_empty());
        let remaining: i64 = connection
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        let state = DeleteProductState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_product_endpoint(Path(404), State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
