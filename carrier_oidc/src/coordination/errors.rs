//! Error types for flow coordination

use thiserror::Error;

use crate::oidc::{FailureCategory, FlowError};

/// Failure of a flow, tagged with the kind of flow that failed.
///
/// By the time one of these is returned the session's flow state has been
/// cleared, and for a step-up the authorization context has been ended.
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// A login attempt failed; the caller is not authenticated.
    #[error("Authentication error: {0}")]
    Authentication(FlowError),

    /// A step-up attempt failed; the existing login is unaffected.
    #[error("Step-up authorization error: {0}")]
    StepUp(FlowError),
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Authentication(err) => {
                tracing::error!("Authentication error ({:?}): {}", err.category(), err)
            }
            Self::StepUp(err) => {
                tracing::error!("Step-up authorization error ({:?}): {}", err.category(), err)
            }
        }
        self
    }

    pub fn flow_error(&self) -> &FlowError {
        match self {
            Self::Authentication(err) | Self::StepUp(err) => err,
        }
    }

    pub fn category(&self) -> FailureCategory {
        self.flow_error().category()
    }

    pub fn is_step_up(&self) -> bool {
        matches!(self, Self::StepUp(_))
    }
}
