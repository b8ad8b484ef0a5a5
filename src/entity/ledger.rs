//! A counterparty's transaction history for a period.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    AppState, Error,
    date_range::{DateRange, DateRangeQuery},
    endpoints,
    entity::{Entity, EntityId, get_entity},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    report::UNKNOWN_PRODUCT,
    timezone::local_today,
    transaction::{TransactionId, TransactionKind},
    user::UserID,
};

/// The state needed for a contact's ledger page.
#[derive(Debug, Clone)]
pub struct EntityLedgerState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for EntityLedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// One transaction in a contact's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub id: TransactionId,
    pub date: Date,
    pub kind: TransactionKind,
    pub product_name: Option<String>,
    pub value: f64,
}

/// Render the contact's transactions in the requested period, newest first.
pub async fn get_entity_ledger_page(
    Path(entity_id): Path<EntityId>,
    State(state): State<EntityLedgerState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = DateRange::from_query(&query, today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entity = get_entity(entity_id, user_id, &connection)?;
    let rows = get_entity_ledger(entity_id, user_id, range, &connection)
        .inspect_err(|error| tracing::error!("Could not get ledger for contact {entity_id}: {error}"))?;

    Ok(ledger_view(&entity, range, &rows).into_response())
}

/// The transactions with `entity_id` in `range`, newest first.
pub fn get_entity_ledger(
    entity_id: EntityId,
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<LedgerRow>, Error> {
    if range.is_empty() {
        return Ok(Vec::new());
    }

    connection
        .prepare(
            "SELECT t.id, t.date, t.kind, p.name, t.value
            FROM \"transaction\" t
            LEFT JOIN product p ON p.id = t.product_id AND p.user_id = t.user_id
            WHERE t.user_id = ?1 AND t.entity_id = ?2 AND t.date BETWEEN ?3 AND ?4
            ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            (user_id.as_i64(), entity_id, range.start, range.end),
            map_ledger_row,
        )?
        .collect::<Result<_, _>>()
        .map_err(Error::from)
}

fn map_ledger_row(row: &Row) -> Result<LedgerRow, rusqlite::Error> {
    Ok(LedgerRow {
        id: row.get(0)?,
        date: row.get(1)?,
        kind: row.get(2)?,
        product_name: row.get(3)?,
        value: row.get(4)?,
    })
}

fn ledger_view(entity: &Entity, range: DateRange, rows: &[LedgerRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ENTITIES_VIEW).into_html();
    let period_total: f64 = rows.iter().map(|row| row.value).sum();
    let this_page = endpoints::format_endpoint(endpoints::ENTITY_VIEW, entity.id);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-4"
            {
                a href=(endpoints::ENTITIES_VIEW) class=(LINK_STYLE) { "Back to contacts" }

                h1 class="text-xl font-bold"
                {
                    (entity.name)
                    span class="ml-2 text-sm font-normal text-gray-500 dark:text-gray-400"
                    {
                        (entity.kind.label())
                    }
                }

                form method="get" action=(this_page) class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="start" class=(FORM_LABEL_STYLE) { "From" }
                        input id="start" type="date" name="start" value=(range.start)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="end" class=(FORM_LABEL_STYLE) { "To" }
                        input id="end" type="date" name="end" value=(range.end)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div { button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" } }
                }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for row in rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (row.date) }
                                td class=(TABLE_CELL_STYLE) { (row.kind.label()) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (row.product_name.as_deref().unwrap_or(UNKNOWN_PRODUCT))
                                }
                                td class=(TABLE_CELL_STYLE) { (format_currency(row.value)) }
                            }
                        }

                        @if rows.is_empty() {
                            tr
                            {
                                td colspan="4" class="px-6 py-4 text-center"
                                {
                                    "No transactions in this period."
                                }
                            }
                        }
                    }

                    tfoot
                    {
                        tr class="font-semibold text-gray-900 dark:text-white"
                        {
                            th scope="row" colspan="3" class=(TABLE_CELL_STYLE) { "Total for period" }
                            td id="period-total" class=(TABLE_CELL_STYLE)
                            {
                                (format_currency(period_total))
                            }
                        }
                    }
                }
            }
        }
    };

    base(entity.name.as_ref(), &[], &content)
}
