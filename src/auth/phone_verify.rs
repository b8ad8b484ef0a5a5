//! Sign in with a phone number verified by the external phone verification
//! widget.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::sign_in::{SignInState, start_session},
    endpoints,
    error::capitalize_first,
    user::find_or_create_user_by_phone,
};

/// The body posted by the phone sign-in widget.
#[derive(Debug, Deserialize, Serialize)]
pub struct PhoneVerifyRequest {
    /// Where the verification service published the verified phone payload.
    pub user_json_url: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhoneVerifyResponse {
    pub success: bool,
    pub phone_number: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct PhoneVerifyError {
    pub error: String,
}

/// Fetch the verified phone payload, check the country prefix, and sign the
/// owner of the phone number in.
///
/// Responds with the page the browser should navigate to: onboarding for new
/// users and the dashboard for everyone else.
pub async fn verify_phone(
    State(state): State<SignInState>,
    jar: PrivateCookieJar,
    Json(request): Json<PhoneVerifyRequest>,
) -> Response {
    let verified = match state
        .identity_client
        .fetch_verified_phone(&request.user_json_url)
        .await
    {
        Ok(verified) => verified,
        Err(error) => {
            tracing::error!("Phone verification failed: {error}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not verify your phone number, please try again",
            );
        }
    };

    let phone_number = verified.user_phone_number.trim().to_owned();
    let prefix = &state.identity_client.config().phone_prefix;

    if !phone_number.starts_with(prefix.as_str()) {
        tracing::warn!("Rejected sign in from a phone number outside {prefix}");
        let error = Error::PhoneNumberNotAllowed(prefix.clone());
        return error_response(StatusCode::BAD_REQUEST, &capitalize_first(&error.to_string()));
    }

    let session = match start_session(&state, jar, |connection| {
        find_or_create_user_by_phone(&phone_number, connection)
    }) {
        Ok(session) => session,
        Err(error) => {
            tracing::error!("Could not start session for a verified phone number: {error}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let redirect_url = if session.needs_onboarding {
        endpoints::ONBOARDING_VIEW
    } else {
        endpoints::DASHBOARD_VIEW
    };

    tracing::info!("User {} signed in with phone", session.user.id);

    (
        session.jar,
        Json(PhoneVerifyResponse {
            success: true,
            phone_number,
            redirect_url: redirect_url.to_owned(),
        }),
    )
        .into_response()
}

fn error_response(status_code: StatusCode, message: &str) -> Response {
    (
        status_code,
        Json(PhoneVerifyError {
            error: message.to_owned(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod phone_verify_tests {
    use axum::{
        Json,
        extract::State,
        http::{StatusCode, header::SET_COOKIE},
        response::Response,
    };
    use axum_extra::extract::PrivateCookieJar;
    use serde::de::DeserializeOwned;
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
        user::find_or_create_user_by_phone,
    };

    use super::{PhoneVerifyError, PhoneVerifyRequest, PhoneVerifyResponse, verify_phone};

    async fn mount_payload(server: &MockServer, phone_number: &str) {
        Mock::given(method("GET"))
            .and(path("/u/payload.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_country_code": "+91",
                "user_phone_number": phone_number,
                "user_first_name": "Asha",
                "user_last_name": "Rao"
            })))
            .mount(server)
            .await;
    }

    async fn call(state: &SignInState, user_json_url: String) -> Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        verify_phone(
            State(state.clone()),
            jar,
            Json(PhoneVerifyRequest { user_json_url }),
        )
        .await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn sets_session(response: &Response) -> bool {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .any(|value| value.to_str().unwrap().starts_with(COOKIE_TOKEN))
    }

    #[tokio::test]
    async fn new_number_is_sent_to_onboarding() {
        let server = MockServer::start().await;
        mount_payload(&server, "+919876543210").await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, format!("{}/u/payload.json", server.uri())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(sets_session(&response));
        let body: PhoneVerifyResponse = read_json(response).await;
        assert_eq!(
            body,
            PhoneVerifyResponse {
                success: true,
                phone_number: "+919876543210".to_owned(),
                redirect_url: endpoints::ONBOARDING_VIEW.to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn onboarded_number_is_sent_to_dashboard() {
        let server = MockServer::start().await;
        mount_payload(&server, "+919876543210").await;
        let state = test_sign_in_state(&server.uri());
        {
            let connection = state.db_connection.lock().unwrap();
            let user = find_or_create_user_by_phone("+919876543210", &connection).unwrap();
            create_profile(user.id, CompanyName::new_unchecked("Acme"), &connection).unwrap();
        }

        let response = call(&state, format!("{}/u/payload.json", server.uri())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: PhoneVerifyResponse = read_json(response).await;
        assert_eq!(body.redirect_url, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn foreign_number_is_rejected() {
        let server = MockServer::start().await;
        mount_payload(&server, "+14155550100").await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, format!("{}/u/payload.json", server.uri())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!sets_session(&response));
        let body: PhoneVerifyError = read_json(response).await;
        assert_eq!(body.error, "Only phone numbers starting with +91 are allowed");
    }

    #[tokio::test]
    async fn failed_fetch_is_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/u/payload.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, format!("{}/u/payload.json", server.uri())).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!sets_session(&response));
        let body: PhoneVerifyError = read_json(response).await;
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn untrusted_host_is_never_fetched() {
        let server = MockServer::start().await;
        let state = test_sign_in_state(&server.uri());

        let response = call(&state, "https://attacker.example/u/payload.json".to_owned()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!sets_session(&response));
    }
}
