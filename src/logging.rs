//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many bytes are truncated at the `info` level and
/// logged in full at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Request fields whose values never appear in the logs: the phone
/// verification payload URL and the OAuth authorization code.
const REDACTED_FIELDS: [&str; 2] = ["user_json_url", "code"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Session cookies are left out, and the values of sensitive fields are
/// replaced in the query string and body.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let body_text = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let query = parts.uri.query().map(redact).unwrap_or_default();
    log_text(
        &format!(
            "Received request: {} {}{}{query}\nheaders: {:#?}",
            parts.method,
            parts.uri.path(),
            if query.is_empty() { "" } else { "?" },
            loggable_headers(&parts.headers)
        ),
        &redact(&body_text),
    );

    // Lossy decoding can change the length of the body.
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    let request = Request::from_parts(parts, Body::from(body_text));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_text(
        &format!(
            "Sending response: {}\nheaders: {:#?}",
            parts.status,
            loggable_headers(&parts.headers)
        ),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn loggable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    headers.remove(COOKIE);
    headers.remove(SET_COOKIE);
    headers.remove(AUTHORIZATION);
    headers
}

/// Replace the values of [REDACTED_FIELDS] in form encoded or JSON text.
fn redact(text: &str) -> String {
    let mut redacted = text.to_owned();

    for field in REDACTED_FIELDS {
        redacted = redact_form_field(&redacted, field);
        redacted = redact_json_field(&redacted, field);
    }

    redacted
}

fn redact_form_field(text: &str, field: &str) -> String {
    text.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == field => format!("{key}={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn redact_json_field(text: &str, field: &str) -> String {
    let key = format!("\"{field}\"");
    let Some(key_start) = text.find(&key) else {
        return text.to_owned();
    };

    let after_key = key_start + key.len();
    let Some(value_start) = text[after_key..]
        .find('"')
        .map(|offset| after_key + offset + 1)
    else {
        return text.to_owned();
    };
    let Some(value_end) = text[value_start..]
        .find('"')
        .map(|offset| value_start + offset)
    else {
        return text.to_owned();
    };

    format!("{}{REDACTED}{}", &text[..value_start], &text[value_end..])
}

fn log_text(summary: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let cut = (0..=LOG_BODY_LENGTH_LIMIT)
            .rev()
            .find(|&index| body.is_char_boundary(index))
            .unwrap_or(0);
        tracing::info!("{summary}\nbody: {}...", &body[..cut]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{summary}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;

    use super::{logging_middleware, redact};

    #[test]
    fn redacts_form_fields() {
        assert_eq!(
            redact("code=abc123&next=%2Fdashboard"),
            "code=********&next=%2Fdashboard"
        );
        assert_eq!(redact("barcode=1"), "barcode=1");
    }

    #[test]
    fn redacts_json_fields() {
        assert_eq!(
            redact(r#"{"user_json_url": "https://user.phone.email/u/1.json"}"#),
            r#"{"user_json_url": "********"}"#
        );
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(redact("company_name=Sharma"), "company_name=Sharma");
    }

    #[tokio::test]
    async fn passes_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server");

        let response = server.post("/echo").text("code=abc123").await;

        response.assert_status_ok();
        response.assert_text("code=abc123");
    }
}
