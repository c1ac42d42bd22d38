use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationKind {
    Login,
    StepUp,
}

/// Pending authorization for the current session.
///
/// `semantic_type` selects the continuation that runs once the flow
/// resolves, `context_message` is shown to the user by the issuer, and
/// `options` carries the continuation's payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationContext {
    kind: AuthorizationKind,
    semantic_type: String,
    context_message: String,
    options: Map<String, Value>,
}

impl AuthorizationContext {
    pub fn step_up(
        semantic_type: impl Into<String>,
        context_message: impl Into<String>,
        options: Map<String, Value>,
    ) -> Self {
        Self {
            kind: AuthorizationKind::StepUp,
            semantic_type: semantic_type.into(),
            context_message: context_message.into(),
            options,
        }
    }

    pub fn kind(&self) -> AuthorizationKind {
        self.kind
    }

    pub fn semantic_type(&self) -> &str {
        &self.semantic_type
    }

    pub fn context_message(&self) -> &str {
        &self.context_message
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Option rendered as text. Strings are returned as-is, numbers and
    /// booleans in their JSON form. Absent, null and empty values are `None`.
    pub fn option_text(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
