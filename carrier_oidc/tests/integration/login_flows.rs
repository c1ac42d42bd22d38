use carrier_oidc::{FailureCategory, FlowError, FlowOutcome, TokenVerificationError};

use crate::common::mock_carrier::{CodeGrant, KNOWN_CARRIER};
use crate::common::test_setup::{TestFlow, redirect_query};

#[tokio::test]
async fn test_first_visit_redirects_to_carrier_chooser() {
    // Given a fresh session
    let flow = TestFlow::new().await;

    // When the callback is hit with no parameters
    let outcome = flow.callback("").await.unwrap();

    // Then the browser goes to the chooser with the state stored on the session
    let FlowOutcome::Redirect(url) = &outcome else {
        panic!("expected redirect");
    };
    assert!(url.starts_with(&flow.carrier.chooser_url()));
    let query = redirect_query(&outcome);
    assert_eq!(query["client_id"], "client-1");
    assert_eq!(query["redirect_uri"], "https://rp.example/auth/cb");
    assert_eq!(
        flow.session().get_state().await.unwrap().as_deref(),
        Some(query["state"].as_str())
    );
}

#[tokio::test]
async fn test_carrier_return_replaces_state_and_caches_carrier() {
    // Given a session that has been sent to the chooser
    let flow = TestFlow::new().await;
    let chooser_state = flow.start().await;

    // When the chooser returns the carrier
    let request = flow.authorize().await;

    // Then a new state is issued and the carrier remembered
    assert_ne!(request["state"], chooser_state);
    assert_eq!(
        flow.session().get_state().await.unwrap().as_deref(),
        Some(request["state"].as_str())
    );
    assert_eq!(
        flow.session().get_cached_carrier().await.unwrap().as_deref(),
        Some(KNOWN_CARRIER)
    );
    assert_eq!(request["scope"], "openid name email phone postal_code");
    assert_eq!(request["response_type"], "code");
    assert_eq!(request["code_challenge_method"], "S256");
    assert!(!request.contains_key("context"));
    assert!(!request.contains_key("acr_values"));
}

#[tokio::test]
async fn test_login_hint_token_is_forwarded() {
    let flow = TestFlow::new().await;
    let state = flow.start().await;

    let outcome = flow
        .callback(&format!(
            "mccmnc={KNOWN_CARRIER}&state={state}&login_hint_token=hint-123"
        ))
        .await
        .unwrap();

    assert_eq!(redirect_query(&outcome)["login_hint_token"], "hint-123");
}

#[tokio::test]
async fn test_carrier_return_with_wrong_state_clears_session() {
    // Given a session that has been sent to the chooser
    let flow = TestFlow::new().await;
    flow.start().await;

    // When the chooser returns with a state the session never issued
    let err = flow
        .callback(&format!("mccmnc={KNOWN_CARRIER}&state=forged"))
        .await
        .unwrap_err();

    // Then the attempt fails and nothing of it survives
    assert_eq!(err.category(), FailureCategory::StateMismatch);
    assert_eq!(flow.session().get_state().await.unwrap(), None);
    assert_eq!(flow.session().get_cached_carrier().await.unwrap(), None);
}

#[tokio::test]
async fn test_carrier_return_without_state_fails() {
    let flow = TestFlow::new().await;
    flow.start().await;

    let err = flow
        .callback(&format!("mccmnc={KNOWN_CARRIER}"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), FailureCategory::StateMismatch);
}

#[tokio::test]
async fn test_unknown_carrier_fails_upstream() {
    let flow = TestFlow::new().await;
    let state = flow.start().await;

    let err = flow
        .callback(&format!("mccmnc=999999&state={state}"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.flow_error(),
        FlowError::UpstreamStatus { status: 404, .. }
    ));
    assert_eq!(flow.session().get_state().await.unwrap(), None);
}

#[tokio::test]
async fn test_full_login() {
    // Given a user who picked a carrier and consented at the issuer
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    flow.consent("abc123", "user-1", &request);
    let pre_login = flow.session();

    // When the issuer returns the code
    let outcome = flow
        .callback(&format!("code=abc123&state={}", request["state"]))
        .await
        .unwrap();

    // Then the user is authenticated with their carrier profile
    let FlowOutcome::Authenticated {
        identity,
        session_id,
    } = outcome
    else {
        panic!("expected authenticated identity");
    };
    assert_eq!(identity.subject(), "user-1");
    assert_eq!(identity.issuer(), flow.carrier.base_url);
    assert_eq!(identity.user_info().display_name(), Some("Jane Doe"));
    assert_eq!(identity.user_info().email(), Some("jane@example.com"));
    assert_eq!(identity.user_info().postal_code(), Some("94105"));

    // And the flow state is gone while the login is kept on the session
    assert_eq!(flow.session().get_state().await.unwrap(), None);
    assert_eq!(flow.session().get_cached_carrier().await.unwrap(), None);
    let stored = flow.session().get_identity().await.unwrap().unwrap();
    assert_eq!(stored.subject(), "user-1");
    assert_eq!(flow.carrier.jwks_requests(), 1);

    // And the login lives under a new session id, not the pre-login one
    assert_ne!(session_id, pre_login.session_id());
    assert_eq!(flow.session().session_id(), session_id);
    assert!(pre_login.get_identity().await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_discovery_returns_accept_state_once() {
    // Given a browser back from the chooser
    let flow = TestFlow::new().await;
    let state = flow.start().await;
    let query = format!("mccmnc={KNOWN_CARRIER}&state={state}");

    // When the same return is delivered twice at once
    let (a, b) = tokio::join!(flow.callback(&query), flow.callback(&query));

    // Then exactly one of them proceeds to the issuer
    let accepted = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    let rejected = if a.is_err() { a } else { b };
    assert_eq!(
        rejected.unwrap_err().category(),
        FailureCategory::StateMismatch
    );
}

#[tokio::test]
async fn test_code_return_may_repeat_carrier() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    flow.consent("abc123", "user-1", &request);

    let outcome = flow
        .callback(&format!(
            "code=abc123&mccmnc={KNOWN_CARRIER}&state={}",
            request["state"]
        ))
        .await
        .unwrap();

    assert!(matches!(outcome, FlowOutcome::Authenticated { .. }));
}

#[tokio::test]
async fn test_code_return_with_wrong_state_never_redeems_code() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    flow.consent("abc123", "user-1", &request);

    let err = flow
        .callback("code=abc123&state=forged")
        .await
        .unwrap_err();

    assert_eq!(err.category(), FailureCategory::StateMismatch);
    assert_eq!(flow.carrier.token_requests(), 0);
    assert_eq!(flow.session().get_cached_carrier().await.unwrap(), None);
    assert!(flow.session().get_identity().await.unwrap().is_none());
}

#[tokio::test]
async fn test_replayed_chooser_state_is_rejected() {
    // Given a flow that already moved past the chooser
    let flow = TestFlow::new().await;
    let chooser_state = flow.start().await;
    flow.callback(&format!("mccmnc={KNOWN_CARRIER}&state={chooser_state}"))
        .await
        .unwrap();

    // When the chooser's state is presented again with a code
    let err = flow
        .callback(&format!("code=abc123&state={chooser_state}"))
        .await
        .unwrap_err();

    // Then it is not accepted
    assert_eq!(err.category(), FailureCategory::StateMismatch);
}

#[tokio::test]
async fn test_code_without_any_carrier_fails() {
    let flow = TestFlow::new().await;

    let err = flow
        .callback("code=abc123&state=whatever")
        .await
        .unwrap_err();

    assert_eq!(err.category(), FailureCategory::MissingInput);
}

#[tokio::test]
async fn test_error_return_reports_upstream_error() {
    // Given a user who reached the issuer
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;

    // When the issuer returns an error
    let err = flow
        .callback(&format!(
            "error=access_denied&error_description=User+denied+consent&state={}",
            request["state"]
        ))
        .await
        .unwrap_err();

    // Then the error and its description are surfaced and the attempt is wiped
    match err.flow_error() {
        FlowError::Upstream { error, description } => {
            assert_eq!(error, "access_denied");
            assert_eq!(description.as_deref(), Some("User denied consent"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(flow.session().get_state().await.unwrap(), None);
    assert_eq!(flow.session().get_cached_carrier().await.unwrap(), None);
}

#[tokio::test]
async fn test_token_endpoint_error_fails_login() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    let mut grant = CodeGrant::new("user-1", &request["nonce"], &request["code_challenge"]);
    grant.token_error = Some("invalid_grant".to_string());
    flow.carrier.issue_code("abc123", grant);

    let err = flow
        .callback(&format!("code=abc123&state={}", request["state"]))
        .await
        .unwrap_err();

    assert!(matches!(err.flow_error(), FlowError::Upstream { error, .. } if error == "invalid_grant"));
    assert!(flow.session().get_identity().await.unwrap().is_none());
}

#[tokio::test]
async fn test_nonce_mismatch_is_fatal() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    flow.carrier.issue_code(
        "abc123",
        CodeGrant::new("user-1", "some-other-nonce", &request["code_challenge"]),
    );

    let err = flow
        .callback(&format!("code=abc123&state={}", request["state"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err.flow_error(),
        FlowError::IdToken(TokenVerificationError::NonceMismatch)
    ));
    assert_eq!(err.category(), FailureCategory::IdTokenInvalid);
    assert!(flow.session().get_identity().await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_id_token_is_fatal() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    let mut grant = CodeGrant::new("user-1", &request["nonce"], &request["code_challenge"]);
    grant.expires_in = -600;
    flow.carrier.issue_code("abc123", grant);

    let err = flow
        .callback(&format!("code=abc123&state={}", request["state"]))
        .await
        .unwrap_err();

    assert_eq!(err.category(), FailureCategory::IdTokenInvalid);
}

#[tokio::test]
async fn test_pkce_mismatch_fails_exchange() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    flow.carrier.issue_code(
        "abc123",
        CodeGrant::new("user-1", &request["nonce"], "not-the-challenge"),
    );

    let err = flow
        .callback(&format!("code=abc123&state={}", request["state"]))
        .await
        .unwrap_err();

    assert!(matches!(err.flow_error(), FlowError::Upstream { error, .. } if error == "invalid_grant"));
}

#[tokio::test]
async fn test_userinfo_subject_must_match_token() {
    let flow = TestFlow::new().await;
    let request = flow.authorize().await;
    let mut grant = CodeGrant::new("user-1", &request["nonce"], &request["code_challenge"]);
    grant.userinfo_sub = Some("user-2".to_string());
    flow.carrier.issue_code("abc123", grant);

    let err = flow
        .callback(&format!("code=abc123&state={}", request["state"]))
        .await
        .unwrap_err();

    assert_eq!(err.category(), FailureCategory::Upstream);
    assert!(flow.session().get_identity().await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_login_reuses_cached_key_set() {
    let flow = TestFlow::new().await;
    for code in ["code-1", "code-2"] {
        let request = flow.authorize().await;
        flow.consent(code, "user-1", &request);
        let outcome = flow
            .callback(&format!("code={code}&state={}", request["state"]))
            .await
            .unwrap();
        assert!(matches!(outcome, FlowOutcome::Authenticated { .. }));
    }

    assert_eq!(flow.carrier.jwks_requests(), 1);
}
