//! Chat lifecycle scenarios against the real client.
//!
//! Each test drives `ChatClient` end to end with the flaky store and the
//! scripted gateway standing in for the remote services.

use chat_core::{AgentReply, SessionStatus, TicketId};
use chat_session::{ChatEvent, ChatPhase, TurnOutcome};
use integration_tests::{fixtures, setup::TestContext};
use realtime_store::RealtimeStore;
use std::time::Duration;

/// Only the first lock has any effect, however the triggers race.
#[tokio::test]
async fn test_lock_is_idempotent_across_triggers() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    let id = chat.start(&user).await.unwrap();

    let (a, b, c) = tokio::join!(
        chat.apply(ChatEvent::TicketClosedByReply),
        chat.apply(ChatEvent::TicketClosedByPush),
        chat.apply(ChatEvent::TicketClosedByReply),
    );
    assert_eq!([a, b, c].iter().filter(|applied| **applied).count(), 1);
    assert_eq!(ctx.store.close_attempts(&id), 1);
}

/// A failed insert leaves nothing local pointing at the missing session.
#[tokio::test]
async fn test_failed_start_commits_nothing() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    ctx.store.set_fail_inserts(true);

    let err = ctx.client.chat().start(&user).await.unwrap_err();
    assert_eq!(err.error_code(), "SESSION_001");
    assert!(err.is_retryable());
    assert!(ctx.local.session_id().is_none());
    assert_eq!(
        ctx.client.chat().phase(),
        ChatPhase::NoSession { expired: false }
    );

    // Retry succeeds once the store recovers
    ctx.store.set_fail_inserts(false);
    let id = ctx.client.chat().start(&user).await.unwrap();
    assert_eq!(ctx.local.session_id(), Some(id));
}

/// A failed replacement keeps the current session usable.
#[tokio::test]
async fn test_failed_restart_keeps_active_session() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let id = ctx.client.chat().start(&user).await.unwrap();
    ctx.store.set_fail_inserts(true);

    assert!(ctx.client.chat().start(&user).await.is_err());
    assert_eq!(ctx.client.chat().phase(), ChatPhase::Active);
    assert_eq!(ctx.client.chat().session_id(), Some(id.clone()));
    assert_eq!(ctx.store.close_attempts(&id), 0);
}

/// Stale activity at startup lands in the expired state and closes the
/// stored session exactly once.
#[tokio::test]
async fn test_stale_activity_at_startup_expires_once() {
    let first = TestContext::new();
    let user = first.logged_in("ana").await;
    let id = first.client.chat().start(&user).await.unwrap();
    first
        .local
        .set_last_activity(chrono::Utc::now() - chrono::Duration::minutes(11))
        .unwrap();

    let second = first.reload();
    assert_eq!(
        second.client.initialize().await,
        chat_session::InitOutcome::Expired
    );
    assert_eq!(
        second.client.chat().phase(),
        ChatPhase::NoSession { expired: true }
    );
    assert!(second.client.auth().current().is_none());
    assert_eq!(second.store.close_attempts(&id), 1);
    assert!(second.local.snapshot().auth_token.is_none());

    // A second initialize has nothing left to close
    second.client.initialize().await;
    assert_eq!(second.store.close_attempts(&id), 1);
}

/// A terminal reply locks the session, then the survey opens.
#[tokio::test]
async fn test_terminal_reply_leads_to_survey() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    let id = chat.start(&user).await.unwrap();
    ctx.gateway.reply_with(AgentReply {
        response: fixtures::CLOSING_TEXT.to_string(),
        ticket_id: Some(TicketId::new("INC-1001")),
        ..Default::default()
    });

    chat.send(&user, "please file it").await.unwrap();
    ctx.settle().await;

    assert_eq!(chat.phase(), ChatPhase::SurveyPending);
    let session = ctx.store.get_session(&id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Closed);

    chat.submit_survey(&user, 5, "great").await.unwrap();
    let surveys = ctx.gateway.surveys();
    assert_eq!(surveys[0].ticket_id, Some(TicketId::new("INC-1001")));
    assert_eq!(surveys[0].rating, "5");
    assert_eq!(chat.phase(), ChatPhase::NoSession { expired: false });
    assert!(ctx.local.ticket_id().is_none());
    assert!(ctx.local.auth_token().is_some());
}

/// The explicit flag closes the session even without the marker text.
#[tokio::test]
async fn test_ticket_created_flag_locks() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    chat.start(&user).await.unwrap();
    ctx.gateway.reply_with(AgentReply {
        response: "Done.".to_string(),
        ticket_created: true,
        ..Default::default()
    });

    let outcome = chat.send(&user, "file it").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Replied { closing: true, .. }));
    ctx.settle().await;
    assert!(chat.phase().is_closed());
}

/// A pushed closing message locks the session with no turn in flight.
#[tokio::test]
async fn test_pushed_terminal_message_locks() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    let id = chat.start(&user).await.unwrap();

    ctx.store.agent_says(&id, fixtures::CLOSING_TEXT).await;
    ctx.settle().await;

    assert_eq!(chat.phase(), ChatPhase::SurveyPending);
    assert_eq!(ctx.gateway.turn_count(), 0);
    assert_eq!(ctx.store.close_attempts(&id), 1);
    let last = chat.snapshot().messages.pop().unwrap();
    assert!(!last.can_rate);
}

/// Reply and push carrying the same closing text lock once.
#[tokio::test]
async fn test_reply_and_push_race_locks_once() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    let id = chat.start(&user).await.unwrap();
    ctx.gateway.reply(fixtures::CLOSING_TEXT);

    chat.send(&user, "close it").await.unwrap();
    ctx.store.agent_says(&id, fixtures::CLOSING_TEXT).await;
    ctx.settle().await;

    assert!(chat.phase().is_closed());
    assert_eq!(ctx.store.close_attempts(&id), 1);
    let agent_lines = chat
        .snapshot()
        .messages
        .iter()
        .filter(|m| m.message.content == fixtures::CLOSING_TEXT)
        .count();
    assert_eq!(agent_lines, 1);
}

/// A second send while one is pending makes no request.
#[tokio::test]
async fn test_single_flight_send() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    ctx.client.chat().start(&user).await.unwrap();
    ctx.gateway.set_delay(Some(Duration::from_millis(60)));
    ctx.gateway.reply("first answer");

    let client = ctx.client.clone();
    let pending_user = user.clone();
    let first = tokio::spawn(async move { client.chat().send(&pending_user, "one").await });
    tokio::time::sleep(Duration::from_millis(15)).await;

    let second = ctx.client.chat().send(&user, "two").await.unwrap();
    assert_eq!(second, TurnOutcome::Busy);
    assert!(matches!(
        first.await.unwrap().unwrap(),
        TurnOutcome::Replied { .. }
    ));
    assert_eq!(ctx.gateway.turn_count(), 1);
    assert_eq!(ctx.client.chat().snapshot().messages.len(), 2);
}

/// Logout with an active session closes it exactly once, before the
/// credential is gone.
#[tokio::test]
async fn test_logout_closes_active_session_once() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let id = ctx.client.chat().start(&user).await.unwrap();

    ctx.client.logout().await;
    assert_eq!(
        ctx.store.status_updates(),
        vec![(id.clone(), SessionStatus::Closed)]
    );
    assert!(ctx.local.auth_token().is_none());
    assert!(ctx.client.auth().current().is_none());
}

/// Logging out while a session is being created leaves nothing behind.
#[tokio::test]
async fn test_logout_during_start_leaves_no_active_session() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    ctx.store.set_insert_delay(Some(Duration::from_millis(50)));

    let client = ctx.client.clone();
    let start = tokio::spawn(async move { client.chat().start(&user).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    ctx.client.logout().await;

    let err = start.await.unwrap().unwrap_err();
    assert_eq!(err.error_code(), "SESSION_001");
    assert!(ctx.client.auth().current().is_none());
    assert_eq!(
        ctx.client.chat().phase(),
        ChatPhase::NoSession { expired: false }
    );
    assert!(ctx.local.session_id().is_none());
    assert!(ctx.local.auth_token().is_none());
    assert_eq!(ctx.store.memory().count_with_status(SessionStatus::Active), 0);
    assert_eq!(ctx.store.memory().count_with_status(SessionStatus::Closed), 1);
}

/// A failed remote close never blocks the local transition.
#[tokio::test]
async fn test_close_failure_does_not_block_lock() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    let id = chat.start(&user).await.unwrap();
    ctx.store.set_fail_updates(true);

    assert!(chat.apply(ChatEvent::TicketClosedByPush).await);
    assert_eq!(chat.phase(), ChatPhase::Locked);
    assert!(ctx.local.session_id().is_none());
    assert_eq!(ctx.store.close_attempts(&id), 1);

    ctx.client.logout().await;
    assert!(ctx.local.auth_token().is_none());
}

/// Five unresolved agent turns raise the ticket prompt, which stays up.
#[tokio::test]
async fn test_escalation_prompt_after_five_turns() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    chat.start(&user).await.unwrap();

    for _ in 0..5 {
        ctx.gateway.reply("Let me look into that.");
        chat.send(&user, "create a ticket").await.unwrap();
    }
    assert!(chat.snapshot().ticket_prompt);

    ctx.gateway.reply("Still looking.");
    chat.send(&user, "any news?").await.unwrap();
    let snapshot = chat.snapshot();
    assert!(snapshot.ticket_prompt);
    assert_eq!(snapshot.phase, ChatPhase::Active);
    assert_eq!(snapshot.agent_turns, 6);
}

/// The store echoes the optimistic user message; it is merged, not doubled.
#[tokio::test]
async fn test_user_echo_is_merged() {
    let ctx = TestContext::new();
    let user = ctx.logged_in("ana").await;
    let chat = ctx.client.chat();
    let id = chat.start(&user).await.unwrap();
    ctx.gateway.reply("On it.");

    chat.send(&user, "printer jammed").await.unwrap();
    let mut echo = chat_core::Message::user(id.clone(), "printer jammed");
    echo.id = ctx.gateway.turns()[0].message_id.clone();
    ctx.store.memory().insert_message(&echo).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let snapshot = chat.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    assert!(snapshot.messages[0].confirmed);
}

/// A failed store read on resume silently downgrades.
#[tokio::test]
async fn test_resume_with_failing_store_downgrades() {
    let first = TestContext::new();
    let user = first.logged_in("ana").await;
    first.client.chat().start(&user).await.unwrap();

    let second = first.reload();
    second.client.initialize().await;
    second.store.set_fail_reads(true);
    let user = second.client.require_user().await.unwrap();
    let snapshot = second.client.load_chat(&user).await;

    assert_eq!(snapshot.phase, ChatPhase::NoSession { expired: false });
    assert!(second.local.session_id().is_none());
}
