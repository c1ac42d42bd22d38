use axum::{
    Router,
    routing::{get, post},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carrier_oidc_axum::{
    CARRIER_OIDC_ROUTE_PREFIX, CarrierOidcState, ContinuationRegistry, FlowConfig,
    TRANSACTION_TYPE, cache_store_from_env, carrier_oidc_router,
};

mod handlers;

use crate::handlers::{authorize_transaction, index};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,carrier_oidc=debug,carrier_oidc_axum=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FlowConfig::from_env()?;
    tracing::info!("Redirect URI: {}", config.redirect_uri);

    let registry = ContinuationRegistry::with_builtin();
    registry.ensure_registered(&[TRANSACTION_TYPE])?;

    let cache = cache_store_from_env().await?;
    let state = CarrierOidcState::new(config, cache, registry)?;

    let app = Router::new()
        .route("/", get(index))
        .route("/authorize-transaction", post(authorize_transaction))
        .with_state(state.clone())
        .nest(CARRIER_OIDC_ROUTE_PREFIX.as_str(), carrier_oidc_router(state));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
