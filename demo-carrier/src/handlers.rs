use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use carrier_oidc_axum::{
    AuthUser, CARRIER_OIDC_ROUTE_PREFIX, CarrierOidcState, TRANSACTION_TYPE, begin_step_up,
};

const RECIPIENT: &str = "John Doe";
const DEFAULT_AMOUNT: &str = "20.00";

#[derive(Template)]
#[template(path = "index_user.j2")]
struct IndexTemplateUser<'a> {
    name: &'a str,
    message: Option<&'a str>,
    recipient: &'a str,
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "index_anon.j2")]
struct IndexTemplateAnon<'a> {
    auth_route_prefix: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct IndexQuery {
    message: Option<String>,
}

pub(crate) async fn index(
    user: Option<AuthUser>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let html = match user {
        Some(u) => IndexTemplateUser {
            name: u.name.as_deref().unwrap_or(&u.subject),
            message: query.message.as_deref(),
            recipient: RECIPIENT,
            auth_route_prefix: CARRIER_OIDC_ROUTE_PREFIX.as_str(),
        }
        .render(),
        None => IndexTemplateAnon {
            auth_route_prefix: CARRIER_OIDC_ROUTE_PREFIX.as_str(),
        }
        .render(),
    }
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Html(html))
}

#[derive(Deserialize)]
pub(crate) struct TransactionForm {
    amount: Option<String>,
}

/// Ask the user's carrier to confirm a transfer before it is made.
pub(crate) async fn authorize_transaction(
    State(state): State<CarrierOidcState>,
    user: AuthUser,
    Form(form): Form<TransactionForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let amount = form
        .amount
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_AMOUNT.to_string());
    let context = format!("Send ${amount} to {RECIPIENT}");

    let mut options = Map::new();
    options.insert("amount".to_string(), Value::String(amount));
    options.insert("recipient".to_string(), Value::String(RECIPIENT.to_string()));

    begin_step_up(&state, &user, TRANSACTION_TYPE, &context, options).await
}
