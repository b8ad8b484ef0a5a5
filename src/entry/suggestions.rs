//! Name suggestions for the entry form's counterparty and product boxes.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    entity::get_entities_by_kind,
    product::get_products,
    search::{is_exact_match, matches_query},
    transaction::TransactionKind,
    user::UserID,
};

const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone)]
pub struct SuggestionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SuggestionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The text typed so far and the kind of entry being recorded.
///
/// The entry form sends the search box under its own name, so that is
/// accepted as well as `q`.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitySuggestionQuery {
    #[serde(default, alias = "entity_search")]
    pub q: String,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSuggestionQuery {
    #[serde(default, alias = "product_search")]
    pub q: String,
}

/// Customers for sales, vendors for purchases.
pub async fn get_entity_suggestions(
    State(state): State<SuggestionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<EntitySuggestionQuery>,
) -> Response {
    let names = match state.db_connection.lock() {
        Ok(connection) => {
            get_entities_by_kind(user_id, query.kind.counterparty_kind(), &connection).map(
                |entities| {
                    entities
                        .into_iter()
                        .map(|entity| entity.name.to_string())
                        .collect::<Vec<_>>()
                },
            )
        }
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match names {
        Ok(names) => suggestion_list("entity", &names, &query.q).into_response(),
        Err(error) => {
            tracing::error!("Could not get contact suggestions: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_product_suggestions(
    State(state): State<SuggestionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ProductSuggestionQuery>,
) -> Response {
    let names = match state.db_connection.lock() {
        Ok(connection) => get_products(user_id, "", &connection).map(|products| {
            products
                .into_iter()
                .map(|product| product.name.to_string())
                .collect::<Vec<_>>()
        }),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match names {
        Ok(names) => suggestion_list("product", &names, &query.q).into_response(),
        Err(error) => {
            tracing::error!("Could not get product suggestions: {error}");
            error.into_alert_response()
        }
    }
}

/// Options for the hidden input `field`. Typed text that is not already a
/// name gets an explicit option to create it; nothing is created until the
/// entry is saved.
fn suggestion_list(field: &str, names: &[String], query: &str) -> Markup {
    let query = query.trim();
    let matches: Vec<&String> = names
        .iter()
        .filter(|name| matches_query(name, query))
        .take(MAX_SUGGESTIONS)
        .collect();
    let offer_create = !query.is_empty() && !names.iter().any(|name| is_exact_match(name, query));
    let option_style = "block w-full px-3 py-2 text-left text-sm hover:bg-gray-100 \
        dark:hover:bg-gray-600";

    html! {
        @for name in matches {
            li role="option"
            {
                button
                    type="button"
                    data-suggestion-for=(field)
                    data-value=(name)
                    class=(option_style)
                {
                    (name)
                }
            }
        }

        @if offer_create {
            li role="option"
            {
                button
                    type="button"
                    data-suggestion-for=(field)
                    data-value=(query)
                    data-create-new="true"
                    class=(format!("{option_style} font-semibold text-blue-600 dark:text-blue-400"))
                {
                    "Create new \"" (query) "\""
                }
            }
        }
    }
}

#[cfg(test)]
mod suggestions_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };

    use crate::{
        entity::{EntityKind, EntityName, resolve_or_create_entity},
        product::{ProductName, resolve_or_create_product},
        test_utils::{create_test_user, get_test_connection, parse_html_fragment, select_texts},
        transaction::TransactionKind,
        user::UserID,
    };

    use super::{
        EntitySuggestionQuery, ProductSuggestionQuery, SuggestionsState, get_entity_suggestions,
        get_product_suggestions,
    };

    fn get_state() -> (SuggestionsState, UserID) {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        for (name, kind) in [
            ("Ravi Stores", EntityKind::Customer),
            ("Ravindra Traders", EntityKind::Vendor),
            ("Anand & Co", EntityKind::Customer),
        ] {
            resolve_or_create_entity(user_id, &EntityName::new_unchecked(name), kind, &connection)
                .unwrap();
        }
        for name in ["Sugar", "Brown Sugar", "Rice"] {
            resolve_or_create_product(user_id, &ProductName::new_unchecked(name), &connection)
                .unwrap();
        }

        (
            SuggestionsState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn entity_suggestions_are_filtered_by_kind() {
        let (state, user_id) = get_state();

        let response = get_entity_suggestions(
            State(state),
            Extension(user_id),
            Query(EntitySuggestionQuery {
                q: "ravi".to_owned(),
                kind: TransactionKind::Sale,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            select_texts(&html, "button"),
            vec!["Ravi Stores", "Create new \"ravi\""]
        );
    }

    #[tokio::test]
    async fn exact_match_does_not_offer_create() {
        let (state, user_id) = get_state();

        let response = get_product_suggestions(
            State(state),
            Extension(user_id),
            Query(ProductSuggestionQuery {
                q: "sugar".to_owned(),
            }),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(select_texts(&html, "button"), vec!["Brown Sugar", "Sugar"]);
        assert!(select_texts(&html, "button[data-create-new]").is_empty());
    }

    #[tokio::test]
    async fn unknown_text_only_offers_create() {
        let (state, user_id) = get_state();

        let response = get_product_suggestions(
            State(state),
            Extension(user_id),
            Query(ProductSuggestionQuery {
                q: " Tea ".to_owned(),
            }),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(select_texts(&html, "button[data-value=Tea]"), vec!["Create new \"Tea\""]);
    }

    #[test]
    fn query_accepts_search_box_name() {
        let query: EntitySuggestionQuery =
            serde_urlencoded::from_str("entity_search=ra&kind=purchase").unwrap();

        assert_eq!(query.q, "ra");
        assert_eq!(query.kind, TransactionKind::Purchase);
    }
}
