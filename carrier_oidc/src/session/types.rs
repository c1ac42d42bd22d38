use serde::{Deserialize, Serialize};

/// Transient security state for the in-flight attempt of one session.
///
/// `csrf_state` and `cached_carrier` are the flow's session state proper.
/// `nonce` and `code_verifier` belong to the authorization request issued
/// after issuer discovery and are only needed for the code exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub(crate) struct StoredFlowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) csrf_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cached_carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) code_verifier: Option<String>,
}
