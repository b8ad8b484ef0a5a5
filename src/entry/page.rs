//! The page and endpoint for recording a single sale or purchase.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    entry::form::EntryForm,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, format_currency, loading_spinner, rupee_input_styles,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{TransactionKind, create_transaction_atomic},
    user::UserID,
};

/// The state needed to record an entry.
#[derive(Debug, Clone)]
pub struct EntryState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for EntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the entry page for a sale or a purchase. Any other kind is a 404.
pub async fn get_entry_page(
    Path(kind): Path<String>,
    State(state): State<EntryState>,
) -> Result<Response, Error> {
    let kind: TransactionKind = kind.parse()?;
    let today = local_today(&state.local_timezone)?;

    Ok(entry_view(kind, today).into_response())
}

/// Validate and save an entry.
///
/// On success the form comes back blank apart from the date, so the next
/// entry for the same day can be typed straight away.
pub async fn create_entry_endpoint(
    Path(kind): Path<String>,
    State(state): State<EntryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<EntryForm>,
) -> Response {
    let kind: TransactionKind = match kind.parse() {
        Ok(kind) => kind,
        Err(error) => return error.into_alert_response(),
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let entry = match form.validate(kind, today) {
        Ok(entry) => entry,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction_atomic(user_id, &entry, &connection) {
        Ok(transaction) => {
            let alert = Alert::Success {
                message: format!("{} saved", kind.label()),
                details: format!(
                    "{} of {} with {} on {}",
                    format_currency(transaction.value),
                    entry.product_name,
                    entry.entity_name,
                    entry.date
                ),
            };

            html! {
                (entry_form(kind, entry.date))
                (alert.into_oob_html())
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not save {kind} for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// A name box that looks up suggestions as the user types. The picked name
/// goes into the hidden `field` input.
fn name_picker(field: &str, label: &str, suggestions_url: &str, kind: TransactionKind) -> Markup {
    let search_name = format!("{field}_search");
    let list_id = format!("{field}-suggestions");

    html! {
        div class="relative"
        {
            label for=(search_name) class=(FORM_LABEL_STYLE) { (label) }

            input type="hidden" name=(field) id=(field) value="";

            input
                type="text"
                name=(search_name)
                id=(search_name)
                autocomplete="off"
                placeholder="Start typing to search"
                required
                data-selection=(field)
                hx-get=(suggestions_url)
                hx-vals=(format!(r#"{{"kind": "{kind}"}}"#))
                hx-trigger="input changed delay:250ms, focus"
                hx-target=(format!("#{list_id}"))
                hx-sync="this:replace"
                class=(FORM_TEXT_INPUT_STYLE);

            ul
                id=(list_id)
                role="listbox"
                class="absolute z-10 w-full mt-1 bg-white rounded shadow dark:bg-gray-700"
            {}
        }
    }
}

fn entry_form(kind: TransactionKind, date: Date) -> Markup {
    let counterparty_label = kind.counterparty_kind().label();

    html! {
        form
            hx-post=(endpoints::format_endpoint(endpoints::ENTRIES_API, kind))
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    required
                    value=(date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (name_picker("entity", counterparty_label, endpoints::ENTITY_SUGGESTIONS, kind))
            (name_picker("product", "Product", endpoints::PRODUCT_SUGGESTIONS, kind))

            div
            {
                label for="value" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        name="value"
                        id="value"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Save " (kind.label())
            }
        }
    }
}

fn entry_view(kind: TransactionKind, date: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::ENTRY_VIEW).into_html();
    let other_kind = match kind {
        TransactionKind::Sale => TransactionKind::Purchase,
        TransactionKind::Purchase => TransactionKind::Sale,
    };
    let title = format!("New {}", kind.label());

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full flex items-baseline justify-between mb-4"
            {
                h2 class="text-xl font-bold" { (title) }

                a
                    href=(endpoints::format_endpoint(endpoints::ENTRY_VIEW, other_kind))
                    class=(LINK_STYLE)
                {
                    "Record a " (other_kind.as_str()) " instead"
                }
            }

            (entry_form(kind, date))

            p class="mt-4 text-sm"
            {
                a href=(endpoints::BULK_ENTRY_VIEW) class=(LINK_STYLE) { "Enter many at once" }
            }
        }
    };

    base(&title, &[rupee_input_styles()], &content)
}
