//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_callback, auth_gateway, get_log_in_page, get_log_out, verify_phone},
    dashboard::get_dashboard_page,
    endpoints,
    entity::{delete_entity_endpoint, get_entities_page, get_entity_ledger_page},
    entry::{
        create_bulk_entries_endpoint, create_entry_endpoint, get_bulk_entry_page,
        get_bulk_entry_row, get_entity_suggestions, get_entry_page, get_product_suggestions,
    },
    error_page::{get_404_not_found, get_internal_server_error_page},
    product::{delete_product_endpoint, get_product_page, get_products_page},
    profile::{create_profile_endpoint, get_onboarding_page},
    report::{
        delete_transaction_endpoint, get_report_document, get_report_spreadsheet,
        get_reports_page,
    },
};

/// Return a router with all the app's routes.
///
/// Every route passes through [auth_gateway], which decides from the path
/// whether a session is required.
pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::AUTH_CALLBACK, get(auth_callback))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ONBOARDING_VIEW, get(get_onboarding_page))
        .route(endpoints::ENTRY_VIEW, get(get_entry_page))
        .route(endpoints::BULK_ENTRY_VIEW, get(get_bulk_entry_page))
        .route(endpoints::BULK_ENTRY_ROW, get(get_bulk_entry_row))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::REPORT_SPREADSHEET, get(get_report_spreadsheet))
        .route(endpoints::REPORT_DOCUMENT, get(get_report_document))
        .route(endpoints::ENTITIES_VIEW, get(get_entities_page))
        .route(endpoints::ENTITY_VIEW, get(get_entity_ledger_page))
        .route(endpoints::PRODUCTS_VIEW, get(get_products_page))
        .route(endpoints::PRODUCT_VIEW, get(get_product_page));

    let api = Router::new()
        .route(endpoints::PHONE_VERIFY_API, post(verify_phone))
        .route(endpoints::PROFILE_API, post(create_profile_endpoint))
        .route(endpoints::ENTRIES_API, post(create_entry_endpoint))
        .route(endpoints::BULK_ENTRIES_API, post(create_bulk_entries_endpoint))
        .route(endpoints::ENTITY_SUGGESTIONS, get(get_entity_suggestions))
        .route(endpoints::DELETE_ENTITY, delete(delete_entity_endpoint))
        .route(endpoints::PRODUCT_SUGGESTIONS, get(get_product_suggestions))
        .route(endpoints::DELETE_PRODUCT, delete(delete_product_endpoint))
        .route(
            endpoints::DELETE_TRANSACTION,
            delete(delete_transaction_endpoint),
        );

    pages
        .merge(api)
        .layer(middleware::from_fn_with_state(state.clone(), auth_gateway))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
