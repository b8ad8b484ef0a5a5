use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    alert::Alert,
    report::{
        ReportQuery,
        page::{ReportState, report_fragment},
    },
    transaction::{TransactionId, delete_transaction},
    user::UserID,
};

/// Delete a transaction from the reports page and send back the report
/// without it, filtered the same way as before.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let (filter, mut ledger) = match state.load(user_id, &query) {
        Ok(loaded) => loaded,
        Err(error) => return error.into_alert_response(),
    };

    {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        if let Err(error) = delete_transaction(transaction_id, user_id, &connection) {
            if error != Error::DeleteMissingTransaction {
                tracing::error!("Could not delete transaction {transaction_id}: {error}");
            }
            return error.into_alert_response();
        }
    }

    ledger.remove(transaction_id);

    html! {
        (report_fragment(&filter, &ledger))
        (Alert::SuccessSimple { message: "Transaction deleted".to_owned() }.into_oob_html())
    }
    .into_response()
}
