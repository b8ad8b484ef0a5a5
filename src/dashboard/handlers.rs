//! The dashboard page: this month's totals and links to everything else.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    dashboard::stats::{MonthlyStats, get_monthly_stats},
    endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::NavBar,
    profile::{Profile, get_profile},
    timezone::local_today,
    transaction::TransactionKind,
    user::UserID,
};

/// Shown in place of the company name when the profile cannot be read.
const FALLBACK_COMPANY_NAME: &str = "My Business";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display this month's totals, or send users without a profile to
/// onboarding.
///
/// Failing to fetch the profile or the totals shows zeros with a notice rather than an
/// error page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let company_name = match get_profile(user_id, &connection) {
        Ok(Some(Profile { company_name, .. })) => company_name.to_string(),
        Ok(None) => return Ok(Redirect::to(endpoints::ONBOARDING_VIEW).into_response()),
        Err(error) => {
            tracing::error!("Could not fetch profile for {user_id}: {error}");
            return Ok(
                dashboard_view(FALLBACK_COMPANY_NAME, MonthlyStats::default(), true)
                    .into_response(),
            );
        }
    };

    let stats = local_today(&state.local_timezone)
        .and_then(|today| get_monthly_stats(user_id, today, &connection))
        .inspect_err(|error| tracing::error!("Could not fetch monthly stats: {error}"));

    let (stats, has_error) = match stats {
        Ok(stats) => (stats, false),
        Err(_) => (MonthlyStats::default(), true),
    };

    Ok(dashboard_view(&company_name, stats, has_error).into_response())
}

fn stat_card(id: &str, title: &str, amount: f64) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p id=(id) class="mt-2 text-2xl font-bold text-gray-900 dark:text-white"
            {
                (format_currency(amount))
            }
        }
    }
}

fn quick_link(url: &str, text: &str) -> Markup {
    html! {
        a href=(url)
            class="flex items-center justify-center rounded-lg border border-gray-200
            bg-white px-4 py-3 text-sm font-semibold text-blue-700 shadow-sm
            hover:bg-blue-50 dark:border-gray-700 dark:bg-gray-800 dark:text-blue-400
            dark:hover:bg-gray-700"
        {
            (text)
        }
    }
}

fn dashboard_view(company_name: &str, stats: MonthlyStats, has_error: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let new_sale = endpoints::format_endpoint(endpoints::ENTRY_VIEW, TransactionKind::Sale);
    let new_purchase = endpoints::format_endpoint(endpoints::ENTRY_VIEW, TransactionKind::Purchase);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-6"
            {
                h1 class="text-xl font-bold" { (company_name) }

                @if has_error {
                    p id="stats-error" role="alert"
                        class="p-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
                    {
                        "This month's totals could not be loaded. Try refreshing the page."
                    }
                }

                section class="grid grid-cols-1 gap-4 sm:grid-cols-2"
                {
                    (stat_card("total-sales", "Sales this month", stats.total_sales))
                    (stat_card("total-purchases", "Purchases this month", stats.total_purchases))
                }

                nav id="quick-links" class="grid grid-cols-2 gap-3 sm:grid-cols-3"
                {
                    (quick_link(&new_sale, "New sale"))
                    (quick_link(&new_purchase, "New purchase"))
                    (quick_link(endpoints::BULK_ENTRY_VIEW, "Bulk entry"))
                    (quick_link(endpoints::REPORTS_VIEW, "Reports"))
                    (quick_link(endpoints::ENTITIES_VIEW, "Contacts"))
                    (quick_link(endpoints::PRODUCTS_VIEW, "Products"))
                }
            }
        }
    };

    base("Dashboard", &[], &content)
}

#[cfg(test)]
mod dashboard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        endpoints,
        entity::EntityName,
        product::ProductName,
        profile::{CompanyName, create_profile},
        test_utils::{
            assert_valid_html, create_test_user, get_header, get_test_connection,
            parse_html_document, select_texts,
        },
        timezone::local_today,
        transaction::{Amount, NewEntry, TransactionKind, create_transaction_atomic},
    };

    use super::{DashboardState, get_dashboard_page};

    #[tokio::test]
    async fn redirects_to_onboarding_without_profile() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Kolkata".to_owned(),
        };

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::ONBOARDING_VIEW);
    }

    #[tokio::test]
    async fn shows_this_months_totals() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        create_profile(
            user_id,
            CompanyName::new_unchecked("Sharma Traders"),
            &connection,
        )
        .unwrap();
        create_transaction_atomic(
            user_id,
            &NewEntry {
                date: local_today("Asia/Kolkata").unwrap(),
                entity_name: EntityName::new_unchecked("Ravi Stores"),
                product_name: ProductName::new_unchecked("Sugar"),
                amount: Amount::parse("290").unwrap(),
                kind: TransactionKind::Sale,
            },
            &connection,
        )
        .unwrap();
        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Kolkata".to_owned(),
        };

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(select_texts(&html, "h1"), vec!["Sharma Traders"]);
        assert_eq!(select_texts(&html, "#total-sales"), vec!["₹290.00"]);
        assert_eq!(select_texts(&html, "#total-purchases"), vec!["₹0.00"]);
        assert!(select_texts(&html, "#stats-error").is_empty());
        let links = Selector::parse("#quick-links a").unwrap();
        assert_eq!(html.select(&links).count(), 6);
    }

    #[tokio::test]
    async fn stats_failure_shows_zeros_and_notice() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        create_profile(
            user_id,
            CompanyName::new_unchecked("Sharma Traders"),
            &connection,
        )
        .unwrap();
        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Not/AZone".to_owned(),
        };

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_eq!(select_texts(&html, "#total-sales"), vec!["₹0.00"]);
        assert_eq!(select_texts(&html, "#stats-error").len(), 1);
    }

    #[tokio::test]
    async fn profile_failure_shows_zeros_and_notice() {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);
        connection.execute("DROP TABLE profile", ()).unwrap();
        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Kolkata".to_owned(),
        };

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_eq!(select_texts(&html, "h1"), vec!["My Business"]);
        assert_eq!(select_texts(&html, "#total-sales"), vec!["₹0.00"]);
        assert_eq!(select_texts(&html, "#total-purchases"), vec!["₹0.00"]);
        assert_eq!(select_texts(&html, "#stats-error").len(), 1);
    }
}
