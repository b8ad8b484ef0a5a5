//! The public landing page with both ways of signing in.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    auth::identity::IdentityClient,
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, base, centered_card},
};

const PHONE_WIDGET_SCRIPT: &str = "https://www.phone.email/sign_in_button_v1.js";

/// The state needed to render the log-in page.
#[derive(Debug, Clone)]
pub struct LogInState {
    pub identity_client: IdentityClient,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            identity_client: state.identity_client.clone(),
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(State(state): State<LogInState>) -> Result<Response, Error> {
    let authorize_url = state.identity_client.authorize_url()?;
    let widget_client_id = &state.identity_client.config().phone_widget_client_id;

    let body = log_in_view(&authorize_url, widget_client_id);

    Ok(base("Log In", &[], &centered_card("Sign in to your account", &body)).into_response())
}

fn log_in_view(authorize_url: &str, widget_client_id: &str) -> Markup {
    html! {
        a
            href=(authorize_url)
            id="oauth-sign-in"
            class=(BUTTON_SECONDARY_STYLE)
        {
            "Sign in with Google"
        }

        div class="flex items-center gap-x-3 text-sm text-gray-500 dark:text-gray-400"
        {
            hr class="flex-1 border-gray-200 dark:border-gray-700";
            span { "or" }
            hr class="flex-1 border-gray-200 dark:border-gray-700";
        }

        // The widget calls `phoneEmailListener` in app.js once the number is verified.
        div
            class="pe_signin_button"
            data-client-id=(widget_client_id)
            data-verify-endpoint=(endpoints::PHONE_VERIFY_API)
        {}

        script src=(PHONE_WIDGET_SCRIPT) async {}

        p class="text-sm font-light text-gray-500 dark:text-gray-400"
        {
            "Phone sign in is available for Indian (+91) numbers."
        }
    }
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::{extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        auth::identity::{IdentityClient, test_identity_config},
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{LogInState, get_log_in_page};

    #[tokio::test]
    async fn offers_both_ways_to_sign_in() {
        let state = LogInState {
            identity_client: IdentityClient::new(test_identity_config(
                "http://provider.test",
                "user.phone.email",
            ))
            .unwrap(),
        };

        let response = get_log_in_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let oauth_link = html
            .select(&Selector::parse("#oauth-sign-in").unwrap())
            .next()
            .expect("No OAuth sign in link");
        assert!(
            oauth_link
                .value()
                .attr("href")
                .unwrap()
                .starts_with("http://provider.test/authorize?")
        );

        let widget = html
            .select(&Selector::parse(".pe_signin_button").unwrap())
            .next()
            .expect("No phone sign in widget");
        assert_eq!(widget.value().attr("data-client-id"), Some("widget-id"));
        assert_eq!(
            widget.value().attr("data-verify-endpoint"),
            Some(endpoints::PHONE_VERIFY_API)
        );
    }
}
