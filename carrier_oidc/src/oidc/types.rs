use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Flow parameters carried on an inbound request's query string.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackParams {
    pub mccmnc: Option<String>,
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub login_hint_token: Option<String>,
}

/// Flow phase selected by the parameters present on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DiscoveryStart,
    DiscoveryReturn,
    CodeReturn,
    ErrorReturn,
}

impl CallbackParams {
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match &*key {
                "mccmnc" => &mut params.mccmnc,
                "state" => &mut params.state,
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                "login_hint_token" => &mut params.login_hint_token,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// `error` wins over `code`, which wins over `mccmnc`.
    pub fn phase(&self) -> Phase {
        if self.error.is_some() {
            Phase::ErrorReturn
        } else if self.code.is_some() {
            Phase::CodeReturn
        } else if self.mccmnc.is_some() {
            Phase::DiscoveryReturn
        } else {
            Phase::DiscoveryStart
        }
    }
}

/// Tokens produced by one successful code exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    access_token: String,
    id_token: String,
    refresh_token: Option<String>,
}

impl TokenBundle {
    pub fn new(access_token: String, id_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            id_token,
            refresh_token,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &"[redacted]")
            .field("id_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::Single(aud) => aud == client_id,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }
}

/// Claims of a validated ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub exp: i64,
    pub iat: i64,
    pub nbf: Option<i64>,
    pub nonce: Option<String>,
    pub acr: Option<String>,
    pub azp: Option<String>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueClaim {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameClaim {
    pub value: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Userinfo response in the carrier schema, where each claim is an object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub sub: String,
    pub name: Option<NameClaim>,
    pub email: Option<ValueClaim>,
    pub phone: Option<ValueClaim>,
    pub postal_code: Option<ValueClaim>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl UserInfo {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_ref().and_then(|n| n.value.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_ref().map(|c| c.value.as_str())
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_ref().map(|c| c.value.as_str())
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_ref().map(|c| c.value.as_str())
    }
}

/// Identity resolved by a completed login flow.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    subject: String,
    issuer: String,
    user_info: UserInfo,
    id_token: String,
    access_token: String,
    refresh_token: Option<String>,
}

impl AuthenticatedIdentity {
    pub fn new(issuer: String, user_info: UserInfo, tokens: TokenBundle) -> Self {
        Self {
            subject: user_info.sub.clone(),
            issuer,
            user_info,
            id_token: tokens.id_token,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn user_info(&self) -> &UserInfo {
        &self.user_info
    }

    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("user_info", &self.user_info)
            .finish_non_exhaustive()
    }
}

/// Result of a step-up continuation: where to send the browser and what to tell the user.
#[derive(Debug, Clone, PartialEq)]
pub struct StepUpOutcome {
    pub redirect: String,
    pub message: String,
}

/// What a flow phase produced.
#[derive(Debug)]
pub enum FlowOutcome {
    /// Suspend: send the browser to this URL.
    Redirect(String),
    /// Login completed; mark the caller as authenticated. `session_id` names
    /// the session that carries the login from now on.
    Authenticated {
        identity: Box<AuthenticatedIdentity>,
        session_id: String,
    },
    /// Step-up completed and routed; no new identity.
    StepUpCompleted(StepUpOutcome),
}

#[cfg(test)]
pub(crate) fn test_identity(sub: &str) -> AuthenticatedIdentity {
    AuthenticatedIdentity::new(
        "https://carrier.example".to_string(),
        UserInfo {
            sub: sub.to_string(),
            name: None,
            email: None,
            phone: None,
            postal_code: None,
            additional: Map::new(),
        },
        TokenBundle::new("access".to_string(), "id.token.sig".to_string(), None),
    )
}
