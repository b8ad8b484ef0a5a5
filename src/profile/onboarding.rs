//! Onboarding page and the endpoint that creates the business profile.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, centered_card},
    profile::{CompanyName, create_profile, has_profile},
    user::UserID,
};

/// The state needed for onboarding.
#[derive(Debug, Clone)]
pub struct OnboardingState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for OnboardingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub company_name: String,
}

/// Render the onboarding page, or send users who already have a profile to
/// the dashboard.
pub async fn get_onboarding_page(
    State(state): State<OnboardingState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if has_profile(user_id, &connection)? {
        return Ok(Redirect::to(endpoints::DASHBOARD_VIEW).into_response());
    }

    Ok(onboarding_view().into_response())
}

/// Create the user's profile and send them to the dashboard.
pub async fn create_profile_endpoint(
    State(state): State<OnboardingState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let company_name = match CompanyName::new(&form.company_name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_profile(user_id, company_name, &connection) {
        Ok(_) | Err(Error::ProfileAlreadyExists) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::OK,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create profile for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn onboarding_view() -> Markup {
    let form = html! {
        p class="text-sm text-gray-600 dark:text-gray-300"
        {
            "Tell us the name of your business to get started."
        }

        form
            hx-post=(endpoints::PROFILE_API)
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="company_name" class=(FORM_LABEL_STYLE) { "Business name" }

                input
                    id="company_name"
                    type="text"
                    name="company_name"
                    placeholder="e.g. Sharma Traders"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Continue" }
        }
    };

    base("Welcome", &[], &centered_card("Welcome to Simple Ledger", &form))
}

#[cfg(test)]
mod onboarding_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        endpoints,
        profile::{CompanyName, create_profile, get_profile},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            create_test_user, get_test_connection, must_get_form, parse_html_document,
        },
    };

    use super::{
        OnboardingState, ProfileForm, create_profile_endpoint, get_onboarding_page,
    };

    fn get_state() -> (OnboardingState, crate::user::UserID) {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection);

        (
            OnboardingState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn renders_company_name_form() {
        let (state, user_id) = get_state();

        let response = get_onboarding_page(State(state), Extension(user_id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::PROFILE_API, "hx-post");
        assert_form_input(&form, "company_name", "text");
    }

    #[tokio::test]
    async fn onboarded_user_is_sent_to_dashboard() {
        let (state, user_id) = get_state();
        create_profile(
            user_id,
            CompanyName::new_unchecked("Acme"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_onboarding_page(State(state), Extension(user_id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::DASHBOARD_VIEW
        );
    }

    #[tokio::test]
    async fn creates_profile_and_redirects() {
        let (state, user_id) = get_state();
        let form = ProfileForm {
            company_name: "  Sharma Traders ".to_owned(),
        };

        let response = create_profile_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        let profile = get_profile(user_id, &state.db_connection.lock().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(profile.company_name.as_ref(), "Sharma Traders");
    }

    #[tokio::test]
    async fn empty_company_name_is_rejected() {
        let (state, user_id) = get_state();
        let form = ProfileForm {
            company_name: "   ".to_owned(),
        };

        let response = create_profile_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_profile(user_id, &state.db_connection.lock().unwrap()),
            Ok(None)
        );
    }
}
