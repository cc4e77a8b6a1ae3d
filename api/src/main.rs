use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;

use pv_api::middleware::IpRateLimiter;
use pv_api::{create_app, telemetry, AppState};
use pv_core::repositories::{InMemorySessionStore, SessionStore};
use pv_core::services::{
    CodeHasher, JanitorConfig, SessionJanitor, VerificationService, VerificationServiceConfig,
};
use pv_infra::cache::{RedisClient, RedisSessionStore};
use pv_infra::delivery::create_dispatcher;
use pv_shared::config::{AppConfig, SessionStoreKind};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    telemetry::init(&config.logging);
    // Again, now that a subscriber is installed to receive the warnings
    config.otp.validate()?;

    info!(
        environment = ?config.environment,
        store = ?config.cache.store,
        provider = %config.delivery.provider,
        "Starting PhoneVerify API server"
    );

    match config.cache.store {
        SessionStoreKind::Memory => {
            if config.environment.is_production() {
                tracing::warn!("In-memory session store does not survive restarts or scale out");
            }
            serve(config, Arc::new(InMemorySessionStore::new())).await
        }
        SessionStoreKind::Redis => {
            let client = RedisClient::new(config.cache.clone())
                .await
                .context("Failed to connect to Redis")?;
            let retention = chrono::Duration::seconds(config.otp.expired_retention_seconds as i64);
            serve(config, Arc::new(RedisSessionStore::new(client, retention))).await
        }
    }
}

async fn serve<S: SessionStore + 'static>(config: AppConfig, store: Arc<S>) -> anyhow::Result<()> {
    let dispatcher = create_dispatcher(&config.delivery, &config.otp)
        .context("Failed to create delivery provider")?;
    let hasher = CodeHasher::new(&config.otp.hash_secret)?;

    let service = Arc::new(VerificationService::new(
        dispatcher,
        store.clone(),
        hasher,
        VerificationServiceConfig::from(&config.otp),
    ));

    let janitor = Arc::new(SessionJanitor::new(store, JanitorConfig::from(&config.otp)));
    let _janitor_handle = janitor.start_background_task();

    let state = web::Data::new(AppState::new(service));
    let limiter = if config.rate_limit.enabled {
        IpRateLimiter::new(config.rate_limit.clone())
    } else {
        IpRateLimiter::disabled()
    };

    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(state.clone(), limiter.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    info!("Server stopped");
    Ok(())
}
