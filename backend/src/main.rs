use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bliss_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::Repositories,
    services::{geo::NoopGeoLocator, mailer::LogMailer},
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bliss_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %mask_database_url(&config.database_url),
        bind_addr = %config.bind_addr,
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiry_days = config.jwt_expiry_days,
        data_protection_key = %mask_secret(&config.data_protection_key),
        cors_allow_origins = ?config.cors_allow_origins,
        password_history_count = config.password_history_count,
        account_lockout_threshold = config.account_lockout_threshold,
        "Loaded configuration from environment/.env"
    );

    let repos = if config.uses_memory_store() {
        tracing::warn!("DATABASE_URL selects the in-memory store; data is lost on exit");
        Repositories::in_memory()
    } else {
        Repositories::postgres(create_pool(&config.database_url).await?)
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(
        config,
        repos,
        Arc::new(LogMailer),
        Arc::new(NoopGeoLocator),
    );
    let app = bliss_backend::app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Hides the password component of a connection string.
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}
