//! Alert messages shown to users after an action succeeds or fails.
//!
//! Error alerts are swapped into the alert container with `hx-target-error`.
//! Success alerts accompany another swap, so they are sent out-of-band.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with success or error styling.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with additional details.
    Success { message: String, details: String },
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message and what the user can do about it.
    Error { message: String, details: String },
}

impl Alert {
    /// Render the alert as a fragment for the alert container.
    pub fn into_html(self) -> Markup {
        let (message, details, style) = match self {
            Alert::Success { message, details } => (message, details, SUCCESS_STYLE),
            Alert::SuccessSimple { message } => (message, String::new(), SUCCESS_STYLE),
            Alert::Error { message, details } => (message, details, ERROR_STYLE),
        };

        html! {
            div role="alert" class=(style)
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="text-lg leading-none"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Render the alert so that htmx swaps it into the alert container
    /// regardless of the request's main target.
    pub fn into_oob_html(self) -> Markup {
        html! {
            div id="alert-container" hx-swap-oob="innerHTML" { (self.into_html()) }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_oob_html().into_response()
    }
}

const SUCCESS_STYLE: &str = "p-4 mb-4 rounded-lg border text-green-800 bg-green-50 \
    border-green-300 dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "p-4 mb-4 rounded-lg border text-red-800 bg-red-50 \
    border-red-300 dark:bg-gray-800 dark:text-red-400 dark:border-red-800";
