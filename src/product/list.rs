//! Products listing page.

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
        BUTTON_DELETE_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    product::{Product, get_products},
    search::SearchQuery,
    user::UserID,
};

#[derive(Debug, Clone)]
pub struct ProductsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProductsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's product catalog, filtered by `?q=`.
pub async fn get_products_page(
    State(state): State<ProductsPageState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<SearchQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let products = get_products(user_id, &query.q, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve products: {error}"))?;

    let markup = if is_htmx {
        product_list(&products, &query.q)
    } else {
        products_view(&products, &query.q)
    };

    Ok(markup.into_response())
}

fn product_list(products: &[Product], query: &str) -> Markup {
    html! {
        div id="product-list" class="dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for product in products {
                        tr class=(TABLE_ROW_STYLE) data-product-id=(product.id)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                a
                                    href=(endpoints::format_endpoint(endpoints::PRODUCT_VIEW, product.id))
                                    class=(LINK_STYLE)
                                {
                                    (product.name)
                                }
                            }

                            td class=(TABLE_CELL_STYLE)
                            {
                                button
                                    hx-delete=(endpoints::format_endpoint(endpoints::DELETE_PRODUCT, product.id))
                                    hx-confirm="Remove this product from your catalog?"
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

                    @if products.is_empty() {
                        tr
                        {
                            td
                                colspan="2"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                @if query.trim().is_empty() {
                                    "No products yet. They are added when you record a sale or purchase."
                                } @else {
                                    "No products match \"" (query.trim()) "\"."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn products_view(products: &[Product], query: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::PRODUCTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="relative w-full max-w-3xl space-y-4"
            {
                h1 class="text-xl font-bold" { "Products" }

                input
                    type="search"
                    name="q"
                    value=(query)
                    placeholder="Search products"
                    aria-label="Search products"
                    hx-get=(endpoints::PRODUCTS_VIEW)
                    hx-trigger="input changed delay:300ms, search"
                    hx-target="#product-list"
                    hx-swap="outerHTML"
                    hx-sync="this:replace"
                    hx-push-url="true"
                    class=(FORM_TEXT_INPUT_STYLE);

                (product_list(products, query))
            }
        }
    };

    base("Products", &[], &content)
}
