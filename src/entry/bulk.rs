//! Recording a month's worth of entries in one go.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    entity::get_entities_by_kind,
    entry::form::BulkEntryForm,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    product::get_products,
    timezone::local_today,
    transaction::{TransactionKind, process_bulk_entries},
    user::UserID,
};

const INITIAL_ROWS: usize = 3;

#[derive(Debug, Clone)]
pub struct BulkEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for BulkEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The kind selected on the bulk entry page. Anything but `purchase` means
/// sales.
#[derive(Debug, Default, Deserialize)]
pub struct BulkEntryQuery {
    pub kind: Option<String>,
}

/// Render the bulk entry page for the current month, with the user's
/// existing names offered as completions.
///
/// Only counterparties of the kind implied by the selected transaction kind
/// are offered. Changing the kind swaps in the matching `#entity-names` list
/// from this same page.
pub async fn get_bulk_entry_page(
    State(state): State<BulkEntryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<BulkEntryQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let kind = query
        .kind
        .as_deref()
        .and_then(|kind| kind.parse().ok())
        .unwrap_or(TransactionKind::Sale);

    let (entity_names, product_names) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let entity_names: Vec<String> =
            get_entities_by_kind(user_id, kind.counterparty_kind(), &connection)?
            .into_iter()
            .map(|entity| entity.name.to_string())
            .collect();
        let product_names: Vec<String> = get_products(user_id, "", &connection)?
            .into_iter()
            .map(|product| product.name.to_string())
            .collect();

        (entity_names, product_names)
    };

    Ok(bulk_entry_view(today, kind, &entity_names, &product_names).into_response())
}

/// A blank row to append to the bulk entry table.
pub async fn get_bulk_entry_row() -> Response {
    bulk_row().into_response()
}

/// Save the complete rows of a bulk submission and go to the dashboard.
///
/// Incomplete rows are dropped. If none are left nothing is saved.
pub async fn create_bulk_entries_endpoint(
    State(state): State<BulkEntryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BulkEntryForm>,
) -> Response {
    let entries = match form.valid_entries() {
        Ok(entries) if entries.is_empty() => return Error::NoValidBulkEntries.into_alert_response(),
        Ok(entries) => entries,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match process_bulk_entries(user_id, &entries, &connection) {
        Ok(transactions) => {
            tracing::info!(
                "Saved {} bulk entries for user {user_id}",
                transactions.len()
            );

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::OK,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not save bulk entries for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn bulk_row() -> Markup {
    html! {
        tr class="bg-white border-b dark:bg-gray-800 dark:border-gray-700"
        {
            td class="px-2 py-2"
            {
                input
                    type="text"
                    name="entity"
                    list="entity-names"
                    aria-label="Contact"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2"
            {
                input
                    type="text"
                    name="product"
                    list="product-names"
                    aria-label="Product"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2"
            {
                input
                    type="number"
                    name="value"
                    step="0.01"
                    min="0.01"
                    aria-label="Amount"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2 text-center"
            {
                button
                    type="button"
                    aria-label="Remove row"
                    onclick="this.closest('tr').remove()"
                    class="text-red-600 hover:text-red-500 dark:text-red-500"
                {
                    "×"
                }
            }
        }
    }
}

fn kind_option(value: &str, label: &str, checked: bool) -> Markup {
    let id = format!("bulk-kind-{value}");

    html! {
        div class="flex items-center gap-3"
        {
            input
                type="radio"
                name="kind"
                id=(id)
                value=(value)
                checked[checked]
                required
                hx-get=(endpoints::BULK_ENTRY_VIEW)
                hx-trigger="change"
                hx-select="#entity-names"
                hx-target="#entity-names"
                hx-swap="outerHTML"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (label) }
        }
    }
}

fn bulk_entry_view(
    today: Date,
    kind: TransactionKind,
    entity_names: &[String],
    product_names: &[String],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::BULK_ENTRY_VIEW).into_html();
    let period = format!("{:04}-{:02}", today.year(), u8::from(today.month()));

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::BULK_ENTRIES_API)
                hx-target-error="#alert-container"
                class="w-full max-w-3xl space-y-4"
            {
                h2 class="text-xl font-bold" { "Bulk Entry" }

                div class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="period" class=(FORM_LABEL_STYLE) { "Month" }
                        input
                            type="month"
                            name="period"
                            id="period"
                            value=(period)
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    fieldset class="flex gap-3"
                    {
                        legend class=(FORM_LABEL_STYLE) { "Type" }
                        (kind_option("sale", "Sales", kind == TransactionKind::Sale))
                        (kind_option("purchase", "Purchases", kind == TransactionKind::Purchase))
                    }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Every row is dated the first day of the month. Incomplete rows are skipped."
                }

                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Contact" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Remove" } }
                        }
                    }

                    tbody id="bulk-rows"
                    {
                        @for _ in 0..INITIAL_ROWS {
                            (bulk_row())
                        }
                    }
                }

                datalist id="entity-names"
                {
                    @for name in entity_names {
                        option value=(name) {}
                    }
                }

                datalist id="product-names"
                {
                    @for name in product_names {
                        option value=(name) {}
                    }
                }

                div class="flex gap-4"
                {
                    button
                        type="button"
                        hx-get=(endpoints::BULK_ENTRY_ROW)
                        hx-target="#bulk-rows"
                        hx-swap="beforeend"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Add row"
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                        " Save all"
                    }
                }
            }
        }
    };

    base("Bulk Entry", &[], &content)
}

#[cfg(test)]
mod bulk_entry_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use scraper::Selector;

    use crate::{
        endpoints,
        entity::{EntityKind, EntityName, resolve_or_create_entity},
        entry::form::BulkEntryForm,
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, create_test_user,
            get_test_connection, must_get_form, parse_html_document, parse_html_fragment,
            select_texts,
        },
        user::UserID,
    };

    use super::{
        BulkEntryQuery, BulkEntryState, create_bulk_entries_endpoint, get_bulk_entry_page,
        get_bulk_entry_row,
    };

    fn get_state() -> (BulkEntryState, UserID) {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);

        (
            BulkEntryState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Asia/Kolkata".to_owned(),
            },
            user_id,
        )
    }

    fn count_transactions(state: &BulkEntryState) -> i64 {
        state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn page_starts_with_three_rows() {
        let (state, user_id) = get_state();

        let response = get_bulk_entry_page(
            State(state),
            Extension(user_id),
            Query(BulkEntryQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::BULK_ENTRIES_API, "hx-post");
        assert_eq!(select_texts(&html, "#bulk-rows tr").len(), 3);
    }

    async fn suggested_entity_names(
        state: &BulkEntryState,
        user_id: UserID,
        kind: &str,
    ) -> Vec<String> {
        let response = get_bulk_entry_page(
            State(state.clone()),
            Extension(user_id),
            Query(BulkEntryQuery {
                kind: Some(kind.to_owned()),
            }),
        )
        .await
        .unwrap();
        let html = parse_html_document(response).await;
        let selector = Selector::parse("#entity-names option").unwrap();

        html.select(&selector)
            .filter_map(|option| option.value().attr("value"))
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn suggests_only_counterparties_of_the_selected_kind() {
        let (state, user_id) = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            resolve_or_create_entity(
                user_id,
                &EntityName::new_unchecked("Ravi Stores"),
                EntityKind::Customer,
                &connection,
            )
            .unwrap();
            resolve_or_create_entity(
                user_id,
                &EntityName::new_unchecked("Gupta Wholesale"),
                EntityKind::Vendor,
                &connection,
            )
            .unwrap();
        }

        assert_eq!(
            suggested_entity_names(&state, user_id, "sale").await,
            vec!["Ravi Stores"]
        );
        assert_eq!(
            suggested_entity_names(&state, user_id, "purchase").await,
            vec!["Gupta Wholesale"]
        );
    }

    #[tokio::test]
    async fn row_fragment_has_all_fields() {
        let response = get_bulk_entry_row().await;

        let html = parse_html_fragment(response).await;
        for name in ["entity", "product", "value"] {
            let selector = format!("input[name={name}]");
            assert_eq!(select_texts(&html, &selector).len(), 1, "missing {name}");
        }
    }

    #[tokio::test]
    async fn saves_valid_rows_and_redirects() {
        let (state, user_id) = get_state();
        let form: BulkEntryForm = serde_html_form::from_str(
            "period=2025-02&kind=sale\
            &entity=Ravi+Stores&product=Sugar&value=40\
            &entity=&product=Rice&value=10\
            &entity=Anand&product=Tea&value=25",
        )
        .unwrap();

        let response =
            create_bulk_entries_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert_eq!(count_transactions(&state), 2);
    }

    #[tokio::test]
    async fn no_valid_rows_is_bad_request() {
        let (state, user_id) = get_state();
        let form: BulkEntryForm = serde_html_form::from_str(
            "period=2025-02&kind=purchase&entity=Gupta&product=&value=40",
        )
        .unwrap();

        let response =
            create_bulk_entries_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count_transactions(&state), 0);
    }
}
