//! Reading and writing the encrypted session cookie.

use axum::http::{HeaderMap, header::SET_COOKIE};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::token::Token, user::UserID};

/// The name of the cookie holding the session token.
pub(crate) const COOKIE_TOKEN: &str = "session";
/// The default duration for which sessions are valid. Each authenticated
/// request slides the expiry forward by this much.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::days(20);

/// Add a session cookie for `user_id` to the cookie jar, valid for
/// `duration` from now.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    set_token(jar, &Token::new(user_id, duration))
}

/// Replace the session cookie with an expired placeholder, which deletes the
/// cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

/// Get the session token from the cookie jar.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no session cookie.
/// - [Error::InvalidSessionToken] if the cookie does not hold a token.
/// - [Error::SessionExpired] if the token has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidSessionToken(error.to_string()))?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::SessionExpired);
    }

    Ok(token)
}

/// Write `token` back to the jar with its expiry pushed out to at least
/// `duration` from now.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token cannot be
/// serialized, in which case the jar is not modified.
pub fn refresh_auth_cookie(
    jar: PrivateCookieJar,
    token: &Token,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    set_token(jar, &token.refreshed(duration, OffsetDateTime::now_utc()))
}

/// Whether a response already sets or clears the session cookie.
pub fn sets_session_cookie(headers: &HeaderMap) -> bool {
    let prefix = format!("{COOKIE_TOKEN}=");

    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

fn set_token(jar: PrivateCookieJar, token: &Token) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, value))
            .path("/")
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    ))
}
