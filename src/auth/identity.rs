//! HTTP client for the OAuth identity provider and the phone verification
//! service.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the identity provider and phone verification service live and the
/// credentials for talking to them.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// The OAuth client ID issued by the identity provider.
    pub client_id: String,
    /// The OAuth client secret issued by the identity provider.
    pub client_secret: String,
    /// The provider's authorization page that users are sent to sign in.
    pub authorize_url: String,
    /// The provider's endpoint for exchanging an authorization code.
    pub token_url: String,
    /// The provider's endpoint describing the signed-in user.
    pub userinfo_url: String,
    /// This app's callback URL registered with the provider.
    pub redirect_url: String,
    /// The only host phone verification payloads are fetched from.
    pub phone_verification_host: String,
    /// Verified phone numbers must start with this country prefix.
    pub phone_prefix: String,
    /// The client ID the phone sign-in widget on the log-in page is registered with.
    pub phone_widget_client_id: String,
}

/// The user reported by the identity provider after a code exchange.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalIdentity {
    /// The provider's stable identifier for the user.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The payload the phone verification service hands back after the user
/// proves they own a phone number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifiedPhone {
    /// The phone number including the country prefix, e.g. "+919876543210".
    pub user_phone_number: String,
    #[serde(default)]
    pub user_first_name: Option<String>,
    #[serde(default)]
    pub user_last_name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Talks to the external identity services. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    config: IdentityConfig,
}

impl IdentityClient {
    /// Create a client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an [Error::IdentityProvider] if the HTTP client cannot be built.
    pub fn new(config: IdentityConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| Error::IdentityProvider(error.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// The provider URL that starts the OAuth sign in.
    ///
    /// # Errors
    ///
    /// Returns an [Error::IdentityProvider] if the query string cannot be encoded.
    pub fn authorize_url(&self) -> Result<String, Error> {
        let query = serde_urlencoded::to_string([
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("scope", "openid email"),
        ])
        .map_err(|error| Error::IdentityProvider(error.to_string()))?;

        Ok(format!("{}?{}", self.config.authorize_url, query))
    }

    /// Exchange an authorization code for the identity of the user who
    /// signed in.
    ///
    /// # Errors
    ///
    /// Returns an [Error::IdentityProvider] if either provider request fails
    /// or returns an unexpected body.
    pub async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, Error> {
        let token: TokenResponse = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| Error::IdentityProvider(format!("token request failed: {error}")))?
            .json()
            .await
            .map_err(|error| Error::IdentityProvider(format!("invalid token response: {error}")))?;

        self.client
            .get(&self.config.userinfo_url)
            .bearer_auth(token.access_token)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| Error::IdentityProvider(format!("userinfo request failed: {error}")))?
            .json()
            .await
            .map_err(|error| Error::IdentityProvider(format!("invalid userinfo response: {error}")))
    }

    /// Fetch the verified phone payload from `user_json_url`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::UntrustedVerificationUrl] if the URL is not an HTTP(S) URL on
    ///   the configured verification host.
    /// - [Error::IdentityProvider] if the request fails or the body is not a
    ///   verification payload.
    pub async fn fetch_verified_phone(&self, user_json_url: &str) -> Result<VerifiedPhone, Error> {
        let url = self.trusted_verification_url(user_json_url)?;

        self.client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| {
                Error::IdentityProvider(format!("verification request failed: {error}"))
            })?
            .json()
            .await
            .map_err(|error| {
                Error::IdentityProvider(format!("invalid verification payload: {error}"))
            })
    }

    fn trusted_verification_url(&self, raw_url: &str) -> Result<Url, Error> {
        let untrusted = || Error::UntrustedVerificationUrl(raw_url.to_owned());
        let url = Url::parse(raw_url).map_err(|_| untrusted())?;

        let is_http = matches!(url.scheme(), "http" | "https");
        let is_trusted_host = url.host_str() == Some(self.config.phone_verification_host.as_str());

        if is_http && is_trusted_host {
            Ok(url)
        } else {
            Err(untrusted())
        }
    }
}

#[cfg(test)]
pub(crate) fn test_identity_config(base_url: &str, verification_host: &str) -> IdentityConfig {
    IdentityConfig {
        client_id: "client-id".to_owned(),
        client_secret: "client-secret".to_owned(),
        authorize_url: format!("{base_url}/authorize"),
        token_url: format!("{base_url}/token"),
        userinfo_url: format!("{base_url}/userinfo"),
        redirect_url: "http://localhost:3000/auth/callback".to_owned(),
        phone_verification_host: verification_host.to_owned(),
        phone_prefix: "+91".to_owned(),
        phone_widget_client_id: "widget-id".to_owned(),
    }
}
