//! Sessions, sign in and the gateway that protects the app's pages.

mod callback;
mod cookie;
mod gateway;
mod identity;
mod log_in;
mod log_out;
mod phone_verify;
mod redirect;
mod sign_in;
mod token;

pub use callback::auth_callback;
pub use cookie::DEFAULT_COOKIE_DURATION;
pub use gateway::{GatewayState, auth_gateway};
pub use identity::{IdentityClient, IdentityConfig};
pub use log_in::get_log_in_page;
pub use log_out::get_log_out;
pub use phone_verify::verify_phone;

#[cfg(test)]
pub(crate) use cookie::{
    COOKIE_TOKEN, get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
};
#[cfg(test)]
pub(crate) use identity::test_identity_config;
