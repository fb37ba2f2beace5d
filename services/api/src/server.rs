use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAccountRepository, InMemoryAuditStore, InMemoryListingRepository,
    InMemorySessionStore,
};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use homi::config::AppConfig;
use homi::error::AppError;
use homi::marketplace::audit::{AuditRecorder, AuditState, AuditTrail};
use homi::marketplace::identity::{Argon2CredentialHasher, IdentityService, IdentityState};
use homi::marketplace::listings::{FsMediaStorage, ListingDesk, ListingsState, SearchEngine};
use homi::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let accounts = Arc::new(InMemoryAccountRepository::default());
    let listings = Arc::new(InMemoryListingRepository::default());
    let audit_store = Arc::new(InMemoryAuditStore::default());
    let sessions = Arc::new(InMemorySessionStore::default());

    let recorder = AuditRecorder::new(audit_store.clone());
    let hasher = Arc::new(Argon2CredentialHasher);
    let media = Arc::new(FsMediaStorage::new(
        config.market.media_dir.clone(),
        "/media",
    ));

    let identity_service = Arc::new(IdentityService::new(
        accounts.clone(),
        hasher,
        recorder.clone(),
    ));
    let desk = Arc::new(ListingDesk::new(listings.clone(), media, recorder));
    let search = Arc::new(SearchEngine::new(listings, &config.market));
    let trail = Arc::new(AuditTrail::new(audit_store, accounts));

    let app = with_marketplace_routes(
        IdentityState {
            service: identity_service,
            sessions: sessions.clone(),
        },
        ListingsState {
            desk,
            search,
            sessions: sessions.clone(),
        },
        AuditState { trail, sessions },
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, city = %config.market.city, "marketplace api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
