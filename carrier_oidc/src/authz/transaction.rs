use crate::oidc::{FlowError, StepUpOutcome};

use super::registry::{StepUpContinuation, StepUpRequest};

/// Semantic type of the built-in money transfer confirmation.
pub const TRANSACTION_TYPE: &str = "transaction";

/// Confirms a transfer once the logged-in user has re-authorized it.
///
/// Requires the `amount` and `recipient` options and an ambient login whose
/// subject and issuer match the freshly validated ID token.
#[derive(Debug, Clone)]
pub struct TransactionContinuation {
    return_path: String,
}

impl TransactionContinuation {
    pub fn new(return_path: impl Into<String>) -> Self {
        Self {
            return_path: return_path.into(),
        }
    }
}

impl Default for TransactionContinuation {
    fn default() -> Self {
        Self::new("/")
    }
}

impl StepUpContinuation for TransactionContinuation {
    fn complete(&self, request: &StepUpRequest<'_>) -> Result<StepUpOutcome, FlowError> {
        let ambient = request.ambient.ok_or_else(|| {
            FlowError::NotAuthenticated("Transaction authorization requires a logged-in user".into())
        })?;

        if ambient.subject() != request.resolved.sub || ambient.issuer() != request.resolved.iss {
            tracing::warn!(
                "Step-up subject {} does not match logged-in subject {}",
                request.resolved.sub,
                ambient.subject()
            );
            return Err(FlowError::IdentityMismatch(
                "Token does not match user sub".to_string(),
            ));
        }

        let context = request.context;
        let amount = context
            .option_text("amount")
            .ok_or_else(|| FlowError::MissingInput("transaction amount".to_string()))?;
        let recipient = context
            .option_text("recipient")
            .ok_or_else(|| FlowError::MissingInput("transaction recipient".to_string()))?;

        let message = format!("Success: ${amount} was sent to {recipient}");
        tracing::info!("Transaction authorized for subject {}", ambient.subject());

        let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
        Ok(StepUpOutcome {
            redirect: format!("{}?message={}", self.return_path, encoded),
            message,
        })
    }
}
