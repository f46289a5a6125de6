//! Optimistic sends reconciled against the server's events

use pretty_assertions::assert_eq;

use chat_relay::client::ClientState;
use chat_relay::domain::value_objects::MessageStatus;
use chat_relay::presentation::websocket::messages::SendMessagePayload;
use chat_relay::presentation::websocket::ClientIntent;

use crate::common::TestApp;

#[tokio::test]
async fn own_message_is_not_duplicated() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    b.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.drain();
    b.drain();

    let mut view = ClientState::new(alice.id.clone());
    let (provisional_id, intent) = view.send_chat_message(&chat.id, "hello", None);
    assert_eq!(
        view.chat(&chat.id).unwrap().get(&provisional_id).unwrap().status,
        MessageStatus::Sending
    );

    a.send(intent).await;
    for event in a.drain() {
        view.apply(event);
    }

    let store = view.chat(&chat.id).unwrap();
    let hellos: Vec<_> = store
        .messages()
        .iter()
        .filter(|m| m.content == "hello")
        .collect();
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].status, MessageStatus::Delivered);
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn content_fallback_without_token() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.drain();

    let mut view = ClientState::new(alice.id.clone());
    let (_, intent) = view.send_chat_message(&chat.id, "no token", None);
    let ClientIntent::MessageSend(payload) = intent else {
        panic!("expected message:send");
    };

    // An older client that does not forward the correlation token.
    a.send(ClientIntent::MessageSend(SendMessagePayload {
        client_ref: None,
        ..payload
    }))
    .await;
    for event in a.drain() {
        view.apply(event);
    }

    let store = view.chat(&chat.id).unwrap();
    assert_eq!(store.messages().len(), 1);
    assert_eq!(store.messages()[0].status, MessageStatus::Sent);
}

#[tokio::test]
async fn peer_view_appends_once() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let a = app.connect(&alice).await;
    let mut phone = app.connect(&bob).await;
    let mut laptop = app.connect(&bob).await;
    for client in [&a, &phone, &laptop] {
        client.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    }
    phone.drain();
    laptop.drain();

    let mut sender = ClientState::new(alice.id.clone());
    let (_, intent) = sender.send_chat_message(&chat.id, "hey", None);
    a.send(intent).await;

    // Both devices' events fed into one view, as after a replay.
    let mut view = ClientState::new(bob.id.clone());
    for event in phone.drain().into_iter().chain(laptop.drain()) {
        view.apply(event);
    }
    assert_eq!(view.chat(&chat.id).unwrap().messages().len(), 1);
}
