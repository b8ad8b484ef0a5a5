//! Completes the OAuth sign in after the identity provider redirects back.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use crate::{
    auth::{
        redirect::post_sign_in_target,
        sign_in::{SignInState, start_session},
    },
    endpoints,
    user::find_or_create_user_by_subject,
};

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Exchange the authorization code for the user's identity and start a
/// session.
///
/// New users are sent to onboarding, returning users to `next` (or the
/// dashboard). Any failure sends the user back to the log-in page.
pub async fn auth_callback(
    State(state): State<SignInState>,
    jar: PrivateCookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        tracing::warn!("OAuth callback without an authorization code");
        return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
    };

    let identity = match state.identity_client.exchange_code(&code).await {
        Ok(identity) => identity,
        Err(error) => {
            tracing::error!("Could not complete OAuth sign in: {error}");
            return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
        }
    };

    let session = match start_session(&state, jar, |connection| {
        find_or_create_user_by_subject(&identity.sub, identity.email.as_deref(), connection)
    }) {
        Ok(session) => session,
        Err(error) => {
            tracing::error!("Could not start session for {}: {error}", identity.sub);
            return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
        }
    };

    let target = if session.needs_onboarding {
        endpoints::ONBOARDING_VIEW.to_owned()
    } else {
        post_sign_in_target(query.next.as_deref())
    };

    tracing::info!("User {} signed in with OAuth", session.user.id);

    (session.jar, Redirect::to(&target)).into_response()
}

#[cfg(test)]
mod auth_callback_tests {
    use axum::{
        extract::{Query, State},
        http::{StatusCode, header::SET_COOKIE},
        response::Response,
    };
    use axum_extra::extract::PrivateCookieJar;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use crate::{
        auth::{
            COOKIE_TOKEN,
            sign_in::{SignInState, test_sign_in_state},
        },
        endpoints,
        profile::{CompanyName, create_profile},
        user::find_or_create_user_by_subject,
    };

    use super::{CallbackQuery, auth_callback};

    async fn mount_provider(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token-1",
                "token_type": "Bearer"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "user-42",
                "email": "owner@example.com"
            })))
            .mount(server)
            .await;
    }

    async fn call(state: &SignInState, code: Option<&str>, next: Option<&str>) -> Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let query = CallbackQuery {
            code: code.map(str::to_owned),
            next: next.map(str::to_owned),
        };

        auth_callback(State(state.clone()), jar, Query(query)).await
    }

    #[track_caller]
    fn assert_redirects_to(response: &Response, location: &str) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), location);
    }

    fn sets_session(response: &Response) -> bool {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .any(|value| value.to_str().unwrap().starts_with(COOKIE_TOKEN))
    }

    #[tokio::test]
    async fn new_user_goes_to_onboarding() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, Some("abc"), None).await;

        assert_redirects_to(&response, endpoints::ONBOARDING_VIEW);
        assert!(sets_session(&response));
    }

    #[tokio::test]
    async fn returning_user_goes_to_next() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let state = test_sign_in_state(&server.uri());
        {
            let connection = state.db_connection.lock().unwrap();
            let user = find_or_create_user_by_subject("user-42", None, &connection).unwrap();
            create_profile(user.id, CompanyName::new_unchecked("Acme"), &connection).unwrap();
        }

        let response = call(&state, Some("abc"), Some("/reports")).await;

        assert_redirects_to(&response, endpoints::REPORTS_VIEW);
        assert!(sets_session(&response));
    }

    #[tokio::test]
    async fn off_site_next_falls_back_to_dashboard() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let state = test_sign_in_state(&server.uri());
        {
            let connection = state.db_connection.lock().unwrap();
            let user = find_or_create_user_by_subject("user-42", None, &connection).unwrap();
            create_profile(user.id, CompanyName::new_unchecked("Acme"), &connection).unwrap();
        }

        let response = call(&state, Some("abc"), Some("https://evil.example")).await;

        assert_redirects_to(&response, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn missing_code_returns_to_log_in() {
        let server = MockServer::start().await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, None, None).await;

        assert_redirects_to(&response, endpoints::LOG_IN_VIEW);
        assert!(!sets_session(&response));
    }

    #[tokio::test]
    async fn failed_exchange_returns_to_log_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, Some("expired"), None).await;

        assert_redirects_to(&response, endpoints::LOG_IN_VIEW);
        assert!(!sets_session(&response));
    }
}
