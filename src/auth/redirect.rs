//! Where to send a user after they sign in.

use axum::http::Uri;

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW && path != endpoints::AUTH_CALLBACK
}

/// The path and query of `raw_url` if it is a same-site path other than the
/// sign-in pages.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The post sign-in destination requested by `next`, falling back to the
/// dashboard when it is missing or points off-site.
pub fn post_sign_in_target(next: Option<&str>) -> String {
    match next {
        Some(next) => normalize_redirect_url(next).unwrap_or_else(|| {
            tracing::warn!("Ignoring unsafe redirect target {next:?}");
            endpoints::DASHBOARD_VIEW.to_owned()
        }),
        None => endpoints::DASHBOARD_VIEW.to_owned(),
    }
}
