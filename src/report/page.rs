//! The reports page: sales or purchases for a period, grouped by product and
//! counterparty.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    report::{
        ReportFilter, ReportLedger, ReportQuery,
        grouping::{UNKNOWN_CONTACT, UNKNOWN_PRODUCT, format_subtotal, group_rows},
        query::get_report_rows,
    },
    timezone::local_today,
    transaction::TransactionKind,
    user::UserID,
};

/// The state needed for the reports page, its exports and deleting from it.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl ReportState {
    /// Parse `query` and fetch the rows it covers.
    pub(super) fn load(
        &self,
        user_id: UserID,
        query: &ReportQuery,
    ) -> Result<(ReportFilter, ReportLedger), Error> {
        let today = local_today(&self.local_timezone)?;
        let filter = ReportFilter::from_query(query, today);

        let connection = self
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let rows = get_report_rows(user_id, filter.range, &connection)
            .inspect_err(|error| tracing::error!("Could not fetch report rows: {error}"))?;

        Ok((filter, ReportLedger::new(rows)))
    }
}

/// Render the report. Requests made by htmx, i.e. from the filter form,
/// only receive the report itself.
pub async fn get_reports_page(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let (filter, ledger) = state.load(user_id, &query)?;

    if is_htmx {
        return Ok(report_fragment(&filter, &ledger).into_response());
    }

    Ok(reports_view(&filter, &ledger).into_response())
}

pub(super) fn report_fragment(filter: &ReportFilter, ledger: &ReportLedger) -> Markup {
    let rows = ledger.of_kind(filter.kind);
    let report = group_rows(rows);
    let query_string = filter.to_query_string();
    let spreadsheet_url = format!("{}?{query_string}", endpoints::REPORT_SPREADSHEET);
    let document_url = format!("{}?{query_string}", endpoints::REPORT_DOCUMENT);

    html! {
        div id="report" class="w-full space-y-6"
        {
            div class="flex gap-4"
            {
                a href=(spreadsheet_url) class=(BUTTON_SECONDARY_STYLE) download { "Download spreadsheet" }
                a href=(document_url) class=(BUTTON_SECONDARY_STYLE) download { "Download PDF" }
            }

            table id="report-summary" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                        th scope="col" class=(TABLE_CELL_STYLE) { (filter.kind.counterparty_kind().label()) }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    }
                }

                @for product in &report.products {
                    tbody
                    {
                        tr class="bg-gray-100 font-semibold text-gray-900 dark:bg-gray-700 dark:text-white"
                        {
                            th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { (product.name) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(product.total)) }
                        }

                        @for counterparty in &product.counterparties {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) {}
                                td class=(TABLE_CELL_STYLE) { (counterparty.name) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (format_subtotal(&format_currency(counterparty.total), counterparty.count))
                                }
                            }
                        }
                    }
                }

                tfoot
                {
                    tr class="font-bold text-gray-900 dark:text-white"
                    {
                        th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total" }
                        td id="grand-total" class=(TABLE_CELL_STYLE) { (format_currency(report.grand_total)) }
                    }
                }
            }

            @if rows.is_empty() {
                p class="text-center text-gray-500 dark:text-gray-400"
                {
                    "No " (filter.kind.plural().to_lowercase()) " in this period."
                }
            } @else {
                h3 class="text-lg font-semibold" { "Transactions" }

                table id="report-transactions" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Contact" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Delete" } }
                        }
                    }

                    tbody
                    {
                        @for row in rows.iter().rev() {
                            tr class=(TABLE_ROW_STYLE) data-transaction-id=(row.id)
                            {
                                td class=(TABLE_CELL_STYLE) { (row.date) }
                                td class=(TABLE_CELL_STYLE) { (row.product_name.as_deref().unwrap_or(UNKNOWN_PRODUCT)) }
                                td class=(TABLE_CELL_STYLE) { (row.entity_name.as_deref().unwrap_or(UNKNOWN_CONTACT)) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(row.value)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    button
                                        hx-delete={
                                            (endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, row.id))
                                            "?" (query_string)
                                        }
                                        hx-confirm="Delete this transaction? This cannot be undone."
                                        hx-target="#report"
                                        hx-swap="outerHTML"
                                        hx-target-error="#alert-container"
                                        class=(BUTTON_DELETE_STYLE)
                                    {
                                        "Delete"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn kind_option(kind: TransactionKind, selected: TransactionKind) -> Markup {
    html!( option value=(kind) selected[kind == selected] { (kind.plural()) } )
}

fn reports_view(filter: &ReportFilter, ledger: &ReportLedger) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-4"
            {
                h1 class="text-xl font-bold" { "Reports" }

                form
                    id="report-filter"
                    hx-get=(endpoints::REPORTS_VIEW)
                    hx-trigger="change"
                    hx-target="#report"
                    hx-swap="outerHTML"
                    hx-sync="this:replace"
                    hx-push-url="true"
                    class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="start" class=(FORM_LABEL_STYLE) { "From" }
                        input id="start" type="date" name="start" value=(filter.range.start)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="end" class=(FORM_LABEL_STYLE) { "To" }
                        input id="end" type="date" name="end" value=(filter.range.end)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="kind" class=(FORM_LABEL_STYLE) { "Show" }
                        select id="kind" name="kind" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            (kind_option(TransactionKind::Sale, filter.kind))
                            (kind_option(TransactionKind::Purchase, filter.kind))
                        }
                    }
                }

                (report_fragment(filter, ledger))
            }
        }
    };

    base("Reports", &[], &content)
}
