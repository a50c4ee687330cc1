mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vatmac_catalog::{ExternalScraper, JsonCatalogFile};
use vatmac_rates::RateResolver;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = vatmac_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let rates = RateResolver::new(config.rate_timeout_secs, &config.rate_user_agent)?;
    let catalog = JsonCatalogFile::new(&config.catalog_path);
    let state = AppState {
        rates: Arc::new(rates),
        catalog,
        scraper: ExternalScraper::from_config(&config),
    };

    let auth = AuthState::new(config.cron_secret.clone());
    if !auth.enabled() {
        if matches!(config.env, vatmac_core::Environment::Production) {
            tracing::warn!("CRON_SECRET is not set; /api/scrape is open to any caller");
        } else {
            tracing::info!("CRON_SECRET is not set; scrape trigger auth disabled");
        }
    }

    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        catalog = %config.catalog_path.display(),
        "vatmac-server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
