//! Login, expiry and logout through the client.

use chat_core::SessionStatus;
use chat_session::{ChatPhase, FileStorage, InitOutcome, SessionStore};
use chrono::{Duration, Utc};
use integration_tests::{
    fixtures,
    setup::{fast_settings, TestContext},
};
use std::sync::Arc;

#[tokio::test]
async fn test_initialize_without_credential_is_anonymous() {
    let ctx = TestContext::new();
    assert!(ctx.client.auth().is_loading());

    assert_eq!(ctx.client.initialize().await, InitOutcome::Anonymous);
    assert_eq!(ctx.client.auth().state().as_str(), "anonymous");
    assert!(!ctx.client.auth().is_loading());
}

#[tokio::test]
async fn test_bad_token_is_rejected() {
    let ctx = TestContext::new();
    ctx.client.initialize().await;

    let err = ctx.client.login("not-a-token").unwrap_err();
    assert_eq!(err.error_code(), "AUTH_002");
    assert!(ctx.local.auth_token().is_none());
    assert!(ctx.client.auth().current().is_none());
}

#[tokio::test]
async fn test_login_persists_credential_and_activity() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;

    assert_eq!(user.username(), "ana");
    assert_eq!(ctx.local.auth_token(), Some(fixtures::token("ana")));
    assert!(ctx.local.last_activity().is_some());

    let reloaded = ctx.reload();
    assert_eq!(reloaded.client.initialize().await, InitOutcome::Authenticated);
    assert_eq!(
        reloaded.client.auth().current().map(|u| u.identity.username),
        Some("ana".to_string())
    );
}

#[tokio::test]
async fn test_expired_credential_at_startup() {
    let ctx = TestContext::new();
    ctx.local
        .set_auth_token(&fixtures::expired_token("ana"))
        .unwrap();

    assert_eq!(ctx.client.initialize().await, InitOutcome::Expired);
    assert_eq!(
        ctx.client.chat().phase(),
        ChatPhase::NoSession { expired: true }
    );
    assert!(ctx.local.auth_token().is_none());
}

#[tokio::test]
async fn test_password_login() {
    let ctx = TestContext::new();
    ctx.client.initialize().await;
    ctx.gateway.set_login_token(Some(fixtures::token("bo")));

    let user = ctx
        .client
        .login_with_password(&fixtures::login_request("bo"))
        .await
        .unwrap();
    assert_eq!(user.username(), "bo");
    assert_eq!(ctx.gateway.logins().len(), 1);
    assert!(ctx.local.auth_token().is_some());
}

#[tokio::test]
async fn test_password_login_without_token_is_rejected() {
    let ctx = TestContext::new();
    ctx.client.initialize().await;
    ctx.gateway.set_login_token(Some("   ".to_string()));

    let err = ctx
        .client
        .login_with_password(&fixtures::login_request("bo"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "AUTH_003");
    assert!(ctx.client.auth().current().is_none());
}

#[tokio::test]
async fn test_invalid_login_form_never_reaches_gateway() {
    let ctx = TestContext::new();
    ctx.client.initialize().await;
    let mut request = fixtures::login_request("bo");
    request.email = Some("not an email".to_string());

    let err = ctx.client.login_with_password(&request).await.unwrap_err();
    assert_eq!(err.error_code(), "VALID_001");
    assert!(ctx.gateway.logins().is_empty());
}

/// Inactivity noticed at a request closes the session once and logs out.
#[tokio::test]
async fn test_inactivity_at_request_expires_session() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let id = ctx.client.chat().start(&user).await.unwrap();
    ctx.local
        .set_last_activity(Utc::now() - Duration::minutes(30))
        .unwrap();

    let err = ctx.client.require_user().await.unwrap_err();
    assert_eq!(err.error_code(), "AUTH_004");
    assert_eq!(
        ctx.client.chat().phase(),
        ChatPhase::NoSession { expired: true }
    );
    assert_eq!(ctx.store.close_attempts(&id), 1);
    assert!(ctx.local.auth_token().is_none());
    assert!(ctx.local.session_id().is_none());

    // Further requests are plain anonymous rejections
    assert!(ctx.client.require_user().await.is_err());
    assert_eq!(ctx.store.close_attempts(&id), 1);
}

#[tokio::test]
async fn test_activity_keeps_login_alive() {
    let ctx = TestContext::new();
    ctx.logged_in("ana").await;
    let before = Utc::now() - Duration::minutes(9);
    ctx.local.set_last_activity(before).unwrap();

    ctx.client.require_user().await.unwrap();
    assert!(ctx.local.last_activity().unwrap() > before);
}

/// Logout with no session touches nothing remote.
#[tokio::test]
async fn test_logout_without_session() {
    let ctx = TestContext::new();
    ctx.logged_in("ana").await;

    ctx.client.logout().await;
    assert!(ctx.store.status_updates().is_empty());
    assert_eq!(ctx.client.auth().state().as_str(), "anonymous");
}

#[tokio::test]
async fn test_logout_after_lock_closes_nothing_more() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let id = ctx.client.chat().start(&user).await.unwrap();
    ctx.client
        .chat()
        .apply(chat_session::ChatEvent::TicketClosedByPush)
        .await;

    ctx.client.logout().await;
    assert_eq!(
        ctx.store.status_updates(),
        vec![(id, SessionStatus::Closed)]
    );
}

/// Login and the active session survive a restart with file storage.
#[tokio::test]
async fn test_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let open = || SessionStore::new(Arc::new(FileStorage::open(&path).unwrap()));

    let ctx = TestContext::with_local(open(), fast_settings());
    let user = ctx.logged_in("ana").await;
    let id = ctx.client.chat().start(&user).await.unwrap();
    ctx.client.dispose();

    let reopened = open();
    assert_eq!(reopened.session_id(), Some(id));
    assert_eq!(reopened.auth_token(), Some(fixtures::token("ana")));

    let restarted = TestContext::with_local(reopened, fast_settings());
    assert_eq!(restarted.client.initialize().await, InitOutcome::Authenticated);
}
