//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/entities/{entity_id}', use [format_endpoint].

use std::fmt::Display;

/// The log-in page, also the public landing page.
pub const LOG_IN_VIEW: &str = "/";
/// Where the identity provider sends the user back to after signing in.
pub const AUTH_CALLBACK: &str = "/auth/callback";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/log_out";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for creating the user's business profile.
pub const ONBOARDING_VIEW: &str = "/onboarding";
/// The page for recording a single sale or purchase.
pub const ENTRY_VIEW: &str = "/entry/{kind}";
/// The page for recording many entries at once.
pub const BULK_ENTRY_VIEW: &str = "/entry/bulk";
/// A blank row for the bulk entry form.
pub const BULK_ENTRY_ROW: &str = "/entry/bulk/row";
/// The report of sales or purchases grouped by product and contact.
pub const REPORTS_VIEW: &str = "/reports";
/// Download the report as a spreadsheet.
pub const REPORT_SPREADSHEET: &str = "/reports/export/spreadsheet";
/// Download the report as a document.
pub const REPORT_DOCUMENT: &str = "/reports/export/document";
/// The page listing the user's customers and vendors.
pub const ENTITIES_VIEW: &str = "/entities";
/// The ledger for a single customer or vendor.
pub const ENTITY_VIEW: &str = "/entities/{entity_id}";
/// The page listing the user's products.
pub const PRODUCTS_VIEW: &str = "/products";
/// The sales and purchase summary for a single product.
pub const PRODUCT_VIEW: &str = "/products/{product_id}";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route the phone sign-in widget posts the verification payload URL to.
pub const PHONE_VERIFY_API: &str = "/api/auth/phone-verify";
/// The route to create the user's business profile.
pub const PROFILE_API: &str = "/api/profile";
/// The route to record a single sale or purchase.
pub const ENTRIES_API: &str = "/api/entries/{kind}";
/// The route to record many entries at once.
pub const BULK_ENTRIES_API: &str = "/api/entries/bulk";
/// Counterparty names matching the search text.
pub const ENTITY_SUGGESTIONS: &str = "/api/entities/suggestions";
/// The route to delete a customer or vendor.
pub const DELETE_ENTITY: &str = "/api/entities/{entity_id}";
/// Product names matching the search text.
pub const PRODUCT_SUGGESTIONS: &str = "/api/products/suggestions";
/// The route to delete a product.
pub const DELETE_PRODUCT: &str = "/api/products/{product_id}";
/// The route to delete a transaction from the report.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// Paths that require a signed-in user. A request whose path starts with
/// any of these is redirected to [LOG_IN_VIEW] when there is no session.
pub const PROTECTED_PATH_PREFIXES: &[&str] = &[
    DASHBOARD_VIEW,
    ENTITIES_VIEW,
    PRODUCTS_VIEW,
    REPORTS_VIEW,
    "/entry",
    ONBOARDING_VIEW,
    "/api/entities",
    "/api/products",
    "/api/entries",
    "/api/transactions",
    PROFILE_API,
];

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/entities/{entity_id}', '{entity_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
