use std::{
    env,
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use simple_ledger::{
    AppState, IdentityClient, IdentityConfig, build_router, graceful_shutdown, logging_middleware,
};

/// The web server for Simple Ledger.
///
/// The cookie secret is read from the `SECRET` environment variable.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The address to listen on.
    #[arg(short, long, env = "ADDRESS", default_value = "127.0.0.1")]
    address: IpAddr,

    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The canonical timezone used for "today", e.g. "Asia/Kolkata".
    #[arg(long, env = "TIMEZONE", default_value = "Asia/Kolkata")]
    timezone: String,

    /// The OAuth client ID issued by the identity provider.
    #[arg(long, env = "OAUTH_CLIENT_ID")]
    oauth_client_id: String,

    /// The OAuth client secret issued by the identity provider.
    #[arg(long, env = "OAUTH_CLIENT_SECRET", hide_env_values = true)]
    oauth_client_secret: String,

    /// The identity provider's authorization page.
    #[arg(long, env = "OAUTH_AUTHORIZE_URL")]
    oauth_authorize_url: String,

    /// The identity provider's code exchange endpoint.
    #[arg(long, env = "OAUTH_TOKEN_URL")]
    oauth_token_url: String,

    /// The identity provider's userinfo endpoint.
    #[arg(long, env = "OAUTH_USERINFO_URL")]
    oauth_userinfo_url: String,

    /// This app's callback URL as registered with the identity provider.
    #[arg(long, env = "OAUTH_REDIRECT_URL")]
    oauth_redirect_url: String,

    /// The client ID for the phone sign-in widget.
    #[arg(long, env = "PHONE_WIDGET_CLIENT_ID", default_value = "")]
    phone_widget_client_id: String,

    /// The only host phone verification payloads are fetched from.
    #[arg(long, env = "PHONE_VERIFICATION_HOST", default_value = "user.phone.email")]
    phone_verification_host: String,

    /// Phone numbers must start with this country prefix to sign in.
    #[arg(long, env = "PHONE_PREFIX", default_value = "+91")]
    phone_prefix: String,

    /// Log every request and response body.
    #[arg(long, env = "LOG_REQUESTS", default_value_t = false)]
    log_requests: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = setup_logging() {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    let Ok(secret) = env::var("SECRET") else {
        tracing::error!("The environment variable 'SECRET' must be set");
        return ExitCode::FAILURE;
    };

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database at {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let identity_client = match IdentityClient::new(IdentityConfig {
        client_id: args.oauth_client_id,
        client_secret: args.oauth_client_secret,
        authorize_url: args.oauth_authorize_url,
        token_url: args.oauth_token_url,
        userinfo_url: args.oauth_userinfo_url,
        redirect_url: args.oauth_redirect_url,
        phone_verification_host: args.phone_verification_host,
        phone_prefix: args.phone_prefix,
        phone_widget_client_id: args.phone_widget_client_id,
    }) {
        Ok(client) => client,
        Err(error) => {
            tracing::error!("Could not create identity client: {error}");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection, &secret, &args.timezone, identity_client) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize app state: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let mut router = build_router(state);
    if args.log_requests {
        router = router.layer(middleware::from_fn(logging_middleware));
    }
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from((args.address, args.port));
    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped with an error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging() -> std::io::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are handled.
        .on_failure(());

    router.layer(tracing_layer)
}
