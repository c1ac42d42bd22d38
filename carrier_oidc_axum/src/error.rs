use http::{Result as HttpResponse, StatusCode};

use carrier_oidc::{CoordinationError, FailureCategory, SessionError};

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

pub(crate) fn coordination_status(err: &CoordinationError) -> StatusCode {
    match (err, err.category()) {
        (_, FailureCategory::Configuration | FailureCategory::Internal) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        (CoordinationError::Authentication(_), _) => StatusCode::UNAUTHORIZED,
        (CoordinationError::StepUp(_), FailureCategory::IdentityMismatch) => StatusCode::FORBIDDEN,
        (CoordinationError::StepUp(_), _) => StatusCode::BAD_REQUEST,
    }
}

/// Failed logins are 401, a step-up resolved to another user is 403 and
/// other step-up failures are 400. Server-side faults are 500.
impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (coordination_status(&e), e.to_string()))
    }
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match e {
                SessionError::Cookie(_) | SessionError::HeaderError(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for HttpResponse<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}
