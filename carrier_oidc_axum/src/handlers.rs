use axum::{
    Router,
    extract::{RawQuery, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use http::{HeaderMap, StatusCode};

use carrier_oidc::{
    CoordinationError, FlowOutcome, SessionStore, new_session_header, prepare_logout_response,
    session_cookie_header,
};

use super::config::{CARRIER_OIDC_REDIRECT_ANON, CARRIER_OIDC_REDIRECT_USER};
use super::error::{IntoResponseError, coordination_status};
use super::state::CarrierOidcState;

pub(super) fn router() -> Router<CarrierOidcState> {
    Router::new()
        .route("/login", get(login))
        .route("/cb", get(callback))
        .route("/logout", get(logout))
}

/// Start a flow from carrier discovery, regardless of the query.
async fn login(
    State(state): State<CarrierOidcState>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    run_flow(&state, &headers, "").await
}

/// Redirect target of the carrier chooser and of the issuer.
async fn callback(
    State(state): State<CarrierOidcState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, (StatusCode, String)> {
    run_flow(&state, &headers, query.as_deref().unwrap_or_default()).await
}

async fn logout(
    State(state): State<CarrierOidcState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Redirect), (StatusCode, String)> {
    if let Some(session) = state.session_from_headers(&headers).into_response_error()? {
        session.logout().await.into_response_error()?;
    }
    let headers = prepare_logout_response().into_response_error()?;
    Ok((headers, Redirect::to(CARRIER_OIDC_REDIRECT_ANON.as_str())))
}

/// Bind the request to a session, minting one if the browser has none.
fn session_for(
    state: &CarrierOidcState,
    headers: &HeaderMap,
) -> Result<(SessionStore, HeaderMap), (StatusCode, String)> {
    match state.session_from_headers(headers).into_response_error()? {
        Some(session) => Ok((session, HeaderMap::new())),
        None => {
            let (session_id, cookie) = new_session_header().into_response_error()?;
            tracing::debug!("Starting new session");
            Ok((state.session(&session_id), cookie))
        }
    }
}

async fn run_flow(
    state: &CarrierOidcState,
    headers: &HeaderMap,
    query: &str,
) -> Result<Response, (StatusCode, String)> {
    let (session, cookie) = session_for(state, headers)?;

    match state.filter().handle(&session, query).await {
        Ok(FlowOutcome::Redirect(url)) => Ok((cookie, Redirect::to(&url)).into_response()),
        Ok(FlowOutcome::Authenticated {
            identity,
            session_id,
        }) => {
            tracing::info!("Login completed for subject {}", identity.subject());
            let cookie = session_cookie_header(&session_id).into_response_error()?;
            Ok((cookie, Redirect::to(CARRIER_OIDC_REDIRECT_USER.as_str())).into_response())
        }
        Ok(FlowOutcome::StepUpCompleted(outcome)) => {
            Ok((cookie, Redirect::to(&outcome.redirect)).into_response())
        }
        Err(err @ CoordinationError::Authentication(_)) => {
            // A failed login leaves nothing behind on the browser.
            if let Err(e) = session.logout().await {
                tracing::error!("Failed to log out session after failed login: {}", e);
            }
            let headers = prepare_logout_response().into_response_error()?;
            Ok((coordination_status(&err), headers, err.to_string()).into_response())
        }
        Err(err) => Ok((coordination_status(&err), cookie, err.to_string()).into_response()),
    }
}
