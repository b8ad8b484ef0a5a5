//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert,
    error_page::{InternalServerError, NotFoundError},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The session cookie is missing from the cookie jar in the request.
    #[error("no session in the cookie jar")]
    CookieMissing,

    /// The session cookie could not be decoded into a session token.
    #[error("could not decode the session token: {0}")]
    InvalidSessionToken(String),

    /// The session token has passed its expiry date.
    #[error("the session has expired")]
    SessionExpired,

    /// An empty string was used as a counterparty name.
    #[error("Customer or vendor name cannot be empty")]
    EmptyEntityName,

    /// An empty string was used as a product name.
    #[error("Product name cannot be empty")]
    EmptyProductName,

    /// An empty string was used as a company name during onboarding.
    #[error("Company name cannot be empty")]
    EmptyCompanyName,

    /// The amount was empty, not a number, not finite, or not greater than zero.
    #[error("\"{0}\" is not a valid amount, enter a number greater than zero")]
    InvalidAmount(String),

    /// The transaction kind was something other than "sale" or "purchase".
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionKind(String),

    /// The counterparty kind was something other than "customer" or "vendor".
    #[error("\"{0}\" is not a valid contact type")]
    InvalidEntityKind(String),

    /// The entry date was not a valid "YYYY-MM-DD" date.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The bulk entry period was not a valid "YYYY-MM" month.
    #[error("\"{0}\" is not a valid month")]
    InvalidPeriod(String),

    /// Every row in a bulk submission was incomplete or invalid.
    #[error("no valid rows to save")]
    NoValidBulkEntries,

    /// The verified phone number does not start with the allowed country prefix.
    #[error("only phone numbers starting with {0} are allowed")]
    PhoneNumberNotAllowed(String),

    /// The phone verification payload URL is not served by the trusted verification host.
    #[error("untrusted verification URL \"{0}\"")]
    UntrustedVerificationUrl(String),

    /// The identity provider or the phone verification service returned an
    /// error or an unexpected response.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("identity provider error: {0}")]
    IdentityProvider(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The user already has a profile.
    #[error("a profile already exists for this user")]
    ProfileAlreadyExists,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a customer or vendor that does not exist
    #[error("tried to delete a contact that is not in the database")]
    DeleteMissingEntity,

    /// Tried to delete a product that does not exist
    #[error("tried to delete a product that is not in the database")]
    DeleteMissingProduct,

    /// A report could not be written to a spreadsheet or document.
    #[error("could not export the report: {0}")]
    ExportError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound | Error::InvalidTransactionKind(_) => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::EmptyEntityName
            | Error::EmptyProductName
            | Error::EmptyCompanyName
            | Error::InvalidAmount(_)
            | Error::InvalidTransactionKind(_)
            | Error::InvalidEntityKind(_)
            | Error::InvalidDate(_)
            | Error::InvalidPeriod(_) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Please check your entry".to_owned(),
                    details: capitalize_first(&self.to_string()),
                },
            ),
            Error::NoValidBulkEntries => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Nothing to save".to_owned(),
                    details: "Fill in the contact, product and a positive amount for at \
                    least one row."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingEntity => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete contact".to_owned(),
                    details: "The contact could not be found. \
                    Try refreshing the page to see if the contact has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingProduct => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete product".to_owned(),
                    details: "The product could not be found. \
                    Try refreshing the page to see if the product has already been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

pub(crate) fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let response = Error::InvalidAmount("-5".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("\"-5\" is not a valid amount"),
            "want amount in alert text, got {text:?}"
        );
    }

    #[tokio::test]
    async fn missing_delete_targets_are_not_found() {
        for error in [
            Error::DeleteMissingEntity,
            Error::DeleteMissingProduct,
            Error::DeleteMissingTransaction,
        ] {
            let response = error.into_alert_response();

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
