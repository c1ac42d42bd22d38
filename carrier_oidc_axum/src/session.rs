use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{TypedHeader, headers};
use http::{Method, StatusCode, request::Parts};

use carrier_oidc::{AuthenticatedIdentity, SESSION_COOKIE_NAME};

use super::config::CARRIER_OIDC_REDIRECT_ANON;
use super::state::CarrierOidcState;

pub struct AuthRedirect {
    method: Method,
}

impl AuthRedirect {
    fn new(method: Method) -> Self {
        Self { method }
    }

    fn into_response_with_method(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", CARRIER_OIDC_REDIRECT_ANON.as_str());
            Redirect::temporary(CARRIER_OIDC_REDIRECT_ANON.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        self.into_response_with_method()
    }
}

/// User logged in through a carrier, available as an Axum extractor
///
/// Resolved from the session cookie and the identity stored on that session
/// by a completed login. GET requests without a login are redirected to
/// `CARRIER_OIDC_REDIRECT_ANON`; other methods get 401.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use carrier_oidc_axum::{AuthUser, CarrierOidcState};
///
/// async fn protected_handler(user: AuthUser) -> String {
///     format!("Hello, {}!", user.name.as_deref().unwrap_or(&user.subject))
/// }
///
/// fn app(state: CarrierOidcState) -> Router {
///     Router::new()
///         .route("/protected", get(protected_handler))
///         .with_state(state)
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Session the login is bound to
    pub session_id: String,
    /// Subject identifier assigned by the carrier's issuer
    pub subject: String,
    /// Issuer that authenticated the user
    pub issuer: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
}

impl AuthUser {
    fn from_identity(session_id: &str, identity: &AuthenticatedIdentity) -> Self {
        let info = identity.user_info();
        Self {
            session_id: session_id.to_string(),
            subject: identity.subject().to_string(),
            issuer: identity.issuer().to_string(),
            name: info.display_name().map(str::to_string),
            email: info.email().map(str::to_string),
            phone: info.phone().map(str::to_string),
            postal_code: info.postal_code().map(str::to_string),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    CarrierOidcState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let method = parts.method.clone();
        let oidc = CarrierOidcState::from_ref(state);

        let cookies: TypedHeader<headers::Cookie> = parts.extract().await.map_err(|_| {
            tracing::debug!("No cookies on request");
            AuthRedirect::new(method.clone())
        })?;

        let session_id = cookies.get(SESSION_COOKIE_NAME.as_str()).ok_or_else(|| {
            tracing::debug!(
                "Session cookie {:?} not found",
                SESSION_COOKIE_NAME.as_str()
            );
            AuthRedirect::new(method.clone())
        })?;
        let session = oidc.session(session_id);

        let identity = session
            .get_identity()
            .await
            .map_err(|e| {
                tracing::error!("Failed to load identity from session: {}", e);
                AuthRedirect::new(method.clone())
            })?
            .ok_or_else(|| {
                tracing::debug!("Session has no login");
                AuthRedirect::new(method.clone())
            })?;

        Ok(AuthUser::from_identity(session.session_id(), &identity))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    CarrierOidcState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let result: Result<Self, Self::Rejection> =
            <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await;
        Ok(result.ok())
    }
}
