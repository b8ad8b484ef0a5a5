//! Customers and vendors listing page.

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
    entity::{Entity, EntityKind, get_entities},
    html::{
        BUTTON_DELETE_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    search::SearchQuery,
    user::UserID,
};

/// The state needed for the contacts listing page.
#[derive(Debug, Clone)]
pub struct EntitiesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EntitiesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's customers and vendors, filtered by `?q=`.
///
/// Requests made by htmx only receive the list so the search box keeps focus.
pub async fn get_entities_page(
    State(state): State<EntitiesPageState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<SearchQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entities = get_entities(user_id, &query.q, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve contacts: {error}"))?;

    if is_htmx {
        return Ok(entity_list(&entities, &query.q).into_response());
    }

    Ok(entities_view(&entities, &query.q).into_response())
}

fn kind_badge(kind: EntityKind) -> Markup {
    let style = match kind {
        EntityKind::Customer => {
            "text-xs font-medium px-2.5 py-0.5 rounded bg-green-100 text-green-800 \
            dark:bg-green-900 dark:text-green-300"
        }
        EntityKind::Vendor => {
            "text-xs font-medium px-2.5 py-0.5 rounded bg-purple-100 text-purple-800 \
            dark:bg-purple-900 dark:text-purple-300"
        }
    };

    html!( span class=(style) { (kind.label()) } )
}

fn entity_list(entities: &[Entity], query: &str) -> Markup {
    html! {
        div id="entity-list" class="dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for entity in entities {
                        tr class=(TABLE_ROW_STYLE) data-entity-id=(entity.id)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                a
                                    href=(endpoints::format_endpoint(endpoints::ENTITY_VIEW, entity.id))
                                    class=(LINK_STYLE)
                                {
                                    (entity.name)
                                }
                            }

                            td class=(TABLE_CELL_STYLE) { (kind_badge(entity.kind)) }

                            td class=(TABLE_CELL_STYLE)
                            {
                                button
                                    hx-delete=(endpoints::format_endpoint(endpoints::DELETE_ENTITY, entity.id))
                                    hx-confirm={
                                        "Are you sure you want to delete '" (entity.name) "'? "
                                        "This will not delete transactions, but the name will "
                                        "be removed from suggestions."
                                    }
                                    hx-target="closest tr"
                                    hx-target-error="#alert-container"
                                    hx-swap="delete"
                                    class=(BUTTON_DELETE_STYLE)
                                {
                                    "Delete"
                                }
                            }
                        }
                    }

                    @if entities.is_empty() {
                        tr
                        {
                            td
                                colspan="3"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                @if query.trim().is_empty() {
                                    "No customers or vendors yet. They are added when you record a sale or purchase."
                                } @else {
                                    "No contacts match \"" (query.trim()) "\"."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn entities_view(entities: &[Entity], query: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::ENTITIES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="relative w-full max-w-3xl space-y-4"
            {
                h1 class="text-xl font-bold" { "Contacts" }

                input
                    type="search"
                    name="q"
                    value=(query)
                    placeholder="Search customers and vendors"
                    aria-label="Search contacts"
                    hx-get=(endpoints::ENTITIES_VIEW)
                    hx-trigger="input changed delay:300ms, search"
                    hx-target="#entity-list"
                    hx-swap="outerHTML"
                    hx-sync="this:replace"
                    hx-push-url="true"
                    class=(FORM_TEXT_INPUT_STYLE);

                (entity_list(entities, query))
            }
        }
    };

    base("Contacts", &[], &content)
}
