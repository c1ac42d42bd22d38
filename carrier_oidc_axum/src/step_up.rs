use axum::response::Redirect;
use http::StatusCode;
use serde_json::{Map, Value};

use carrier_oidc::{CARRIER_OIDC_ROUTE_PREFIX, FailureCategory};

use super::session::AuthUser;
use super::state::CarrierOidcState;

/// Record a step-up for the logged-in `user` and send the browser back
/// through carrier discovery to authorize it.
///
/// `semantic_type` must be registered in the state's continuation registry.
pub async fn begin_step_up(
    state: &CarrierOidcState,
    user: &AuthUser,
    semantic_type: &str,
    context_message: &str,
    options: Map<String, Value>,
) -> Result<Redirect, (StatusCode, String)> {
    let session = state.session(&user.session_id);
    state
        .filter()
        .begin_step_up(&session, semantic_type, context_message, options)
        .await
        .map_err(|e| {
            let status = match e.category() {
                FailureCategory::Configuration | FailureCategory::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            };
            (status, e.to_string())
        })?;

    tracing::info!(
        "Step-up '{}' started for subject {}",
        semantic_type,
        user.subject
    );
    Ok(Redirect::to(&format!(
        "{}/login",
        CARRIER_OIDC_ROUTE_PREFIX.as_str()
    )))
}
