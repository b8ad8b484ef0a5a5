#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use form::{assert_form_input, assert_hx_endpoint, input_value, must_get_form};
pub(crate) use html::{
    assert_valid_html, parse_html_document, parse_html_fragment, select_texts,
};
pub(crate) use http::{assert_hx_redirect, get_header, read_body_text};

use axum::{http::header::SET_COOKIE, response::IntoResponse};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};
use rusqlite::Connection;

use crate::{
    auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
    db::initialize,
    user::{UserID, find_or_create_user_by_phone},
};

/// An in-memory database with the application schema.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// Insert a user signed in by phone and return their ID.
pub(crate) fn create_test_user(connection: &Connection) -> UserID {
    create_user_with_phone("+919876543210", connection)
}

pub(crate) fn create_user_with_phone(phone_number: &str, connection: &Connection) -> UserID {
    find_or_create_user_by_phone(phone_number, connection)
        .expect("Could not create test user")
        .id
}

/// A session cookie for `user_id` encrypted with `key`, as a browser would
/// send it back.
pub(crate) fn auth_cookie(user_id: UserID, key: &Key) -> Cookie<'static> {
    let jar = set_auth_cookie(
        PrivateCookieJar::new(key.clone()),
        user_id,
        DEFAULT_COOKIE_DURATION,
    )
    .expect("Could not set auth cookie");
    let response = jar.into_response();
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("No session cookie set")
        .to_str()
        .expect("Cookie header is not valid text");

    Cookie::parse(header.to_owned()).expect("Could not parse session cookie")
}
