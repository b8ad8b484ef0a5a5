//! Lifetime sales and purchase figures for one product.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    entity::{Entity, EntityKind, EntityName},
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::NavBar,
    product::{Product, ProductId, get_product},
    transaction::TransactionKind,
    user::UserID,
};

#[derive(Debug, Clone)]
pub struct ProductDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProductDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// What a product has earned and cost, and who it was traded with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductSummary {
    pub total_sales: f64,
    pub total_purchases: f64,
    pub customers: Vec<Entity>,
    pub vendors: Vec<Entity>,
}

pub async fn get_product_page(
    Path(product_id): Path<ProductId>,
    State(state): State<ProductDetailState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let product = get_product(product_id, user_id, &connection)?;
    let summary = get_product_summary(product_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not summarize product {product_id}: {error}"))?;

    Ok(product_view(&product, &summary).into_response())
}

/// Totals by transaction kind, and the distinct counterparties that still
/// exist, for the transactions of `product_id`.
pub fn get_product_summary(
    product_id: ProductId,
    user_id: UserID,
    connection: &Connection,
) -> Result<ProductSummary, Error> {
    let mut summary = ProductSummary::default();

    let totals = connection
        .prepare(
            "SELECT kind, SUM(value) FROM \"transaction\"
            WHERE user_id = ?1 AND product_id = ?2
            GROUP BY kind",
        )?
        .query_map((user_id.as_i64(), product_id), |row| {
            Ok((row.get::<_, TransactionKind>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (kind, total) in totals {
        match kind {
            TransactionKind::Sale => summary.total_sales = total,
            TransactionKind::Purchase => summary.total_purchases = total,
        }
    }

    let counterparties = connection
        .prepare(
            "SELECT DISTINCT e.id, e.name, e.kind FROM \"transaction\" t
            INNER JOIN entity e ON e.id = t.entity_id AND e.user_id = t.user_id
            WHERE t.user_id = ?1 AND t.product_id = ?2
            ORDER BY e.name COLLATE NOCASE, e.id",
        )?
        .query_map((user_id.as_i64(), product_id), |row| {
            let name: String = row.get(1)?;

            Ok(Entity {
                id: row.get(0)?,
                name: EntityName::new_unchecked(&name),
                kind: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for entity in counterparties {
        match entity.kind {
            EntityKind::Customer => summary.customers.push(entity),
            EntityKind::Vendor => summary.vendors.push(entity),
        }
    }

    Ok(summary)
}

fn counterparty_list(title: &str, id: &str, entities: &[Entity]) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="mb-2 text-lg font-semibold" { (title) }

            @if entities.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400" { "None yet." }
            } @else {
                ul id=(id) class="space-y-1"
                {
                    @for entity in entities {
                        li
                        {
                            a
                                href=(endpoints::format_endpoint(endpoints::ENTITY_VIEW, entity.id))
                                class=(LINK_STYLE)
                            {
                                (entity.name)
                            }
                        }
                    }
                }
            }
        }
    }
}

fn product_view(product: &Product, summary: &ProductSummary) -> Markup {
    let nav_bar = NavBar::new(endpoints::PRODUCTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-4"
            {
                a href=(endpoints::PRODUCTS_VIEW) class=(LINK_STYLE) { "Back to products" }

                h1 class="text-xl font-bold" { (product.name) }

                div class="grid gap-4 sm:grid-cols-2"
                {
                    div class=(CARD_STYLE)
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Total sales" }
                        p id="total-sales" class="text-2xl font-bold" { (format_currency(summary.total_sales)) }
                    }

                    div class=(CARD_STYLE)
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Total purchases" }
                        p id="total-purchases" class="text-2xl font-bold" { (format_currency(summary.total_purchases)) }
                    }

                    (counterparty_list("Customers", "customers", &summary.customers))
                    (counterparty_list("Vendors", "vendors", &summary.vendors))
                }
            }
        }
    };

    base(product.name.as_ref(), &[], &content)
}
