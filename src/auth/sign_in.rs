//! State and helpers shared by the two ways of signing in.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{cookie::set_auth_cookie, identity::IdentityClient},
    profile::has_profile,
    user::User,
};

/// The state needed to sign a user in.
#[derive(Debug, Clone)]
pub struct SignInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which new sessions are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
    pub identity_client: IdentityClient,
}

impl FromRef<AppState> for SignInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
            identity_client: state.identity_client.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignInState> for Key {
    fn from_ref(state: &SignInState) -> Self {
        state.cookie_key.clone()
    }
}

/// A freshly started session.
pub(crate) struct Session {
    pub jar: PrivateCookieJar,
    pub user: User,
    /// Whether the user still needs to create their profile.
    pub needs_onboarding: bool,
}

/// Look up (or create) the user with `find_user`, then add a session cookie
/// for them to `jar`.
///
/// The database lock is released before this function returns, so callers
/// must finish any network requests before calling it.
///
/// # Errors
///
/// Returns an error if the database lock cannot be acquired, `find_user`
/// fails, or the session cookie cannot be created.
pub(crate) fn start_session<F>(
    state: &SignInState,
    jar: PrivateCookieJar,
    find_user: F,
) -> Result<Session, Error>
where
    F: FnOnce(&Connection) -> Result<User, Error>,
{
    let (user, needs_onboarding) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = find_user(&connection)?;
        let onboarded = has_profile(user.id, &connection)?;

        (user, !onboarded)
    };

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok(Session {
        jar,
        user,
        needs_onboarding,
    })
}

#[cfg(test)]
pub(crate) fn test_sign_in_state(identity_base_url: &str) -> SignInState {
    use sha2::{Digest, Sha512};

    use crate::{
        auth::{DEFAULT_COOKIE_DURATION, identity::test_identity_config},
        db::initialize,
    };

    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();

    SignInState {
        cookie_key: Key::from(&Sha512::digest("sign in test secret")),
        cookie_duration: DEFAULT_COOKIE_DURATION,
        db_connection: Arc::new(Mutex::new(connection)),
        identity_client: IdentityClient::new(test_identity_config(identity_base_url, "127.0.0.1"))
            .unwrap(),
    }
}
