//! Router for the carrier OIDC endpoints

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::state::CarrierOidcState;

/// Create the router for the carrier OIDC endpoints
///
/// Mount it at `CARRIER_OIDC_ROUTE_PREFIX`. The endpoints will be available at:
/// - {CARRIER_OIDC_ROUTE_PREFIX}/login - start a flow at carrier discovery
/// - {CARRIER_OIDC_ROUTE_PREFIX}/cb - redirect URI registered with the carrier
/// - {CARRIER_OIDC_ROUTE_PREFIX}/logout - drop the session's login
pub fn carrier_oidc_router(state: CarrierOidcState) -> Router {
    carrier_oidc_router_no_trace(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new()
                    .level(Level::INFO)
                    .include_headers(true),
            )
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as `carrier_oidc_router()` but without the HTTP tracing middleware.
pub fn carrier_oidc_router_no_trace(state: CarrierOidcState) -> Router {
    super::handlers::router().with_state(state)
}
