//! Store failures and slow writes on the realtime path

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use chat_relay::domain::value_objects::MessageStatus;
use chat_relay::presentation::websocket::messages::SendMessagePayload;
use chat_relay::presentation::websocket::ClientIntent;

use crate::common::{
    error_messages, received_messages, statuses, FaultyChatRepository, FaultyMessageRepository,
    TestApp,
};

fn failing_app() -> (TestApp, Arc<FaultyMessageRepository>) {
    let mut failing = None;
    let app = TestApp::with_repos(|mut repos| {
        let wrapper = FaultyMessageRepository::wrap(repos.messages.clone());
        repos.messages = wrapper.clone();
        failing = Some(wrapper);
        repos
    });
    (app, failing.unwrap())
}

fn send(chat_id: &chat_relay::domain::value_objects::ChatId, content: &str) -> ClientIntent {
    ClientIntent::MessageSend(SendMessagePayload {
        chat_id: chat_id.clone(),
        content: content.into(),
        reply_to_id: None,
        client_ref: None,
    })
}

#[tokio::test]
async fn failed_persist_only_tells_the_sender() {
    let (app, failing) = failing_app();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    b.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.drain();
    b.drain();

    failing.fail_creates(true);
    a.send(send(&chat.id, "lost")).await;

    assert_eq!(
        error_messages(&a.drain()),
        vec!["Something went wrong, please try again".to_string()]
    );
    assert!(b.drain().is_empty());

    // The connection keeps working once the store recovers.
    failing.fail_creates(false);
    a.send(send(&chat.id, "found")).await;
    assert_eq!(received_messages(&b.drain()).len(), 1);
}

#[tokio::test]
async fn failed_status_write_leaves_message_sent() {
    let (app, failing) = failing_app();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    let _b = app.connect(&bob).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.drain();

    failing.fail_status_updates(true);
    a.send(send(&chat.id, "still here")).await;

    let events = a.drain();
    assert_eq!(received_messages(&events).len(), 1);
    assert!(statuses(&events).is_empty());
    assert!(error_messages(&events).is_empty());

    let id = received_messages(&events)[0].id.clone();
    assert_eq!(app.stored_message(&id).await.unwrap().status, MessageStatus::Sent);
}

#[tokio::test]
async fn failed_activity_bump_still_delivers() {
    let mut faulty = None;
    let app = TestApp::with_repos(|mut repos| {
        let wrapper = FaultyChatRepository::wrap(repos.chats.clone());
        repos.chats = wrapper.clone();
        faulty = Some(wrapper);
        repos
    });
    let chats = faulty.unwrap();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    b.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.drain();
    b.drain();

    chats.fail_touch(true);
    a.send(send(&chat.id, "sent once")).await;

    let a_events = a.drain();
    assert!(error_messages(&a_events).is_empty());
    assert_eq!(received_messages(&a_events).len(), 1);
    assert_eq!(received_messages(&b.drain()).len(), 1);
    assert_eq!(app.chat_messages(&chat.id).await.len(), 1);
}

#[tokio::test]
async fn slow_edit_keeps_a_concurrent_seen() {
    let (app, faulty) = failing_app();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.send(send(&chat.id, "draft")).await;
    let id = received_messages(&a.drain())[0].id.clone();

    faulty.delay_edits(Duration::from_millis(50));
    let edit = app
        .state
        .chat_service
        .edit_message(&chat.id, &id, &alice.id, "final");
    let fetch = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.state.chat_service.get_chat_messages(&chat.id, &bob.id).await
    };
    let (edited, history) = tokio::join!(edit, fetch);

    assert_eq!(history.unwrap()[0].status, MessageStatus::Seen);
    let (_, edited) = edited.unwrap();
    assert_eq!(edited.status, MessageStatus::Seen);

    let stored = app.stored_message(&id).await.unwrap();
    assert_eq!(stored.status, MessageStatus::Seen);
    assert_eq!(stored.content, "final");
}
