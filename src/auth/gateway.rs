//! The boundary middleware that refreshes sessions and redirects based on
//! whether the request comes from a signed-in user.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        cookie::{get_token_from_cookies, refresh_auth_cookie, sets_session_cookie},
        token::Token,
    },
    endpoints,
    user::get_user_by_id,
};

/// The state needed for the auth gateway.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How far each authenticated request pushes out the session expiry.
    pub cookie_duration: Duration,
    /// Used to check that the session's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Requests whose path starts with one of these need a signed-in user.
    pub protected_prefixes: Arc<[String]>,
}

impl FromRef<AppState> for GatewayState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
            protected_prefixes: state.protected_prefixes.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<GatewayState> for Key {
    fn from_ref(state: &GatewayState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware applied to every route.
///
/// - A signed-in user visiting the log-in page is sent to the dashboard.
/// - A request without a session for a protected path is sent to the log-in page.
/// - Otherwise the request is handled as normal. For signed-in users the
///   user ID is placed into the request extensions and the session cookie on
///   the response has its expiry pushed out.
///
/// Requests made by htmx are redirected with the `HX-Redirect` header so the
/// whole page navigates instead of swapping the redirect target into the page.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_gateway(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let is_htmx = request.headers().contains_key("hx-request");

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Treating request as signed out.");
            return next.run(Request::from_parts(parts, body)).await;
        }
    };

    let Some(token) = resolve_session(&jar, &state) else {
        if is_protected(&path, &state.protected_prefixes) {
            return redirect(endpoints::LOG_IN_VIEW, is_htmx);
        }

        return next.run(Request::from_parts(parts, body)).await;
    };

    if path == endpoints::LOG_IN_VIEW {
        return redirect(endpoints::DASHBOARD_VIEW, is_htmx);
    }

    parts.extensions.insert(token.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let (mut parts, body) = response.into_parts();
    // Handlers that sign the user in or out own the session cookie for this response.
    if sets_session_cookie(&parts.headers) {
        return Response::from_parts(parts, body);
    }

    let jar = match refresh_auth_cookie(jar.clone(), &token, state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending session: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// The session for the request, if it has a valid token for a user that
/// still exists. Anything else counts as signed out.
fn resolve_session(jar: &PrivateCookieJar, state: &GatewayState) -> Option<Token> {
    let token = match get_token_from_cookies(jar) {
        Ok(token) => token,
        Err(Error::CookieMissing) => return None,
        Err(error) => {
            tracing::debug!("Ignoring session cookie: {error}");
            return None;
        }
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .ok()?;

    match get_user_by_id(token.user_id, &connection) {
        Ok(_) => Some(token),
        Err(Error::NotFound) => {
            tracing::warn!("Session for unknown user {}", token.user_id);
            None
        }
        Err(error) => {
            tracing::error!("Could not look up session user {}: {error}", token.user_id);
            None
        }
    }
}

fn is_protected(path: &str, protected_prefixes: &[String]) -> bool {
    protected_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

fn redirect(url: &str, is_htmx: bool) -> Response {
    if is_htmx {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    } else {
        Redirect::to(url).into_response()
    }
}
