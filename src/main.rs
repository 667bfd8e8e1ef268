//! MIGA Shop - storefront and back-office API

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use miga_shop::auth::{CallbackSecret, JwtService};
use miga_shop::domain::events::EventPublisher;
use miga_shop::store::PgStore;
use miga_shop::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = PgStore::connect(&config.database_url, config.database_max_connections)
        .await
        .context("connecting to database")?;
    sqlx::migrate!("./migrations").run(store.pool()).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events disabled");
                None
            }
        },
        None => None,
    };

    let jwt = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let callback_secret = CallbackSecret::new(&config.payment_callback_secret);
    let state = AppState::new(Arc::new(store), EventPublisher::new(nats), jwt, callback_secret);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("MIGA Shop listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
