//! Readvault server binary.
//!
//! Loads configuration, wires adapters to ports, and serves the API.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use readvault::adapters::catalog::YamlPlanCatalog;
use readvault::adapters::http::{api_router, AppState};
use readvault::adapters::session::JwtSessionResolver;
use readvault::adapters::storage::{
    InMemoryAuditLog, InMemoryLedger, LocalResourceStore, PostgresAuditLog, PostgresLedger,
};
use readvault::config::AppConfig;
use readvault::domain::access::ResourceRegistry;
use readvault::domain::billing::NotificationVerifier;
use readvault::ports::{AuditLog, PaymentStore, SubscriptionLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let catalog = Arc::new(YamlPlanCatalog::load(&config.catalog.path)?);
    tracing::info!(plans = catalog.len(), "plan catalog loaded");

    let registry_yaml = std::fs::read_to_string(&config.content.registry_path)?;
    let registry = Arc::new(ResourceRegistry::from_yaml(&registry_yaml)?);
    tracing::info!(resources = registry.len(), "resource registry loaded");

    let resources = Arc::new(LocalResourceStore::new(&config.content.resource_dir));
    let sessions = Arc::new(JwtSessionResolver::new_hs256(
        config.session.jwt_secret.expose_secret().as_bytes(),
    ));
    let verifier =
        NotificationVerifier::new(config.payment.webhook_secret.expose_secret().clone());

    let (payments, ledger, audit) = build_storage(&config).await?;

    let state = AppState::new(
        catalog,
        payments,
        ledger,
        audit,
        sessions,
        registry,
        resources,
        verifier,
        config.payment.checkout_base_url.clone(),
    );

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config));

    let app = api_router().with_state(state).layer(middleware);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "readvault listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Select the storage backend from configuration.
///
/// With a database configured, the PostgreSQL ledger carries the
/// per-token atomic grant across instances; without one, the in-memory
/// ledger serves single-process deployments.
async fn build_storage(
    config: &AppConfig,
) -> Result<
    (
        Arc<dyn PaymentStore>,
        Arc<dyn SubscriptionLedger>,
        Arc<dyn AuditLog>,
    ),
    Box<dyn Error>,
> {
    match &config.database {
        Some(database) => {
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("database connected, migrations applied");

            let store = Arc::new(PostgresLedger::new(pool.clone()));
            Ok((
                store.clone() as Arc<dyn PaymentStore>,
                store as Arc<dyn SubscriptionLedger>,
                Arc::new(PostgresAuditLog::new(pool)),
            ))
        }
        None => {
            tracing::warn!("no database configured; using non-persistent in-memory storage");
            let store = Arc::new(InMemoryLedger::new());
            Ok((
                store.clone() as Arc<dyn PaymentStore>,
                store as Arc<dyn SubscriptionLedger>,
                Arc::new(InMemoryAuditLog::new()),
            ))
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
    } else {
        CorsLayer::new().allow_origin(origins)
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
