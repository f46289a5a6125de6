//! Typing indicators

use std::time::Duration;

use pretty_assertions::assert_eq;

use chat_relay::domain::entities::Chat;
use chat_relay::domain::value_objects::RoomId;
use chat_relay::presentation::websocket::messages::{SendMessagePayload, TypingPayload};
use chat_relay::presentation::websocket::{ClientIntent, ServerEvent};

use crate::common::{error_messages, test_settings, TestApp, TestClient};

fn typing(chat: &Chat) -> TypingPayload {
    TypingPayload {
        chat_id: Some(chat.id.clone()),
        channel_id: None,
    }
}

async fn joined(app: &TestApp) -> (Chat, TestClient, TestClient) {
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    a.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    b.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    a.drain();
    b.drain();
    (chat, a, b)
}

#[tokio::test]
async fn start_and_stop_are_relayed_to_others_only() {
    let app = TestApp::new();
    let (chat, mut a, mut b) = joined(&app).await;

    a.send(ClientIntent::TypingStart(typing(&chat))).await;
    let events = b.drain();
    let ServerEvent::TypingStart(event) = &events[0] else {
        panic!("expected typing:start");
    };
    assert_eq!(event.user_id, a.user_id);
    assert_eq!(event.chat_id.as_ref(), Some(&chat.id));
    assert!(a.drain().is_empty());

    a.send(ClientIntent::TypingStop(typing(&chat))).await;
    a.send(ClientIntent::TypingStop(typing(&chat))).await;
    assert_eq!(b.drain_names(), vec!["typing:stop"]);
}

#[tokio::test]
async fn typing_requires_a_joined_connection() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut a = app.connect(&alice).await;

    a.send(ClientIntent::TypingStart(typing(&chat))).await;

    assert_eq!(
        error_messages(&a.drain()),
        vec!["You have not joined this conversation".to_string()]
    );
    assert!(!app
        .state
        .typing
        .is_typing(&RoomId::Chat(chat.id.clone()), &alice.id));
}

#[tokio::test]
async fn typing_payload_needs_a_target() {
    let app = TestApp::new();
    let (_chat, mut a, _b) = joined(&app).await;

    a.send(ClientIntent::TypingStart(TypingPayload::default())).await;

    assert_eq!(error_messages(&a.drain()).len(), 1);
}

#[tokio::test]
async fn typists_other_devices_see_the_indicator() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let mut phone = app.connect(&alice).await;
    let mut laptop = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    for client in [&mut phone, &mut laptop, &mut b] {
        client.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    }
    phone.drain();
    laptop.drain();
    b.drain();

    phone.send(ClientIntent::TypingStart(typing(&chat))).await;

    assert!(phone.drain().is_empty());
    let events = laptop.drain();
    let ServerEvent::TypingStart(event) = &events[0] else {
        panic!("expected typing:start, got {:?}", events);
    };
    assert_eq!(event.user_id, alice.id);
    assert_eq!(b.drain_names(), vec!["typing:start"]);

    phone.send(ClientIntent::TypingStop(typing(&chat))).await;
    assert!(phone.drain().is_empty());
    assert_eq!(laptop.drain_names(), vec!["typing:stop"]);
    assert_eq!(b.drain_names(), vec!["typing:stop"]);
}

#[tokio::test]
async fn payload_naming_chat_and_channel_signals_both() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let channel = app.create_channel(&alice, "news", &[&bob]).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    for client in [&mut a, &mut b] {
        client.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    }
    b.send(ClientIntent::ChannelJoin(channel.id.clone())).await;
    a.drain();
    b.drain();

    let both = TypingPayload {
        chat_id: Some(chat.id.clone()),
        channel_id: Some(channel.id.clone()),
    };

    // Not joined to the channel yet: nothing is relayed anywhere.
    a.send(ClientIntent::TypingStart(both.clone())).await;
    assert_eq!(
        error_messages(&a.drain()),
        vec!["You have not joined this conversation".to_string()]
    );
    assert!(b.drain().is_empty());

    a.send(ClientIntent::ChannelJoin(channel.id.clone())).await;
    a.send(ClientIntent::TypingStart(both)).await;

    let events = b.drain();
    let rooms: Vec<(Option<_>, Option<_>)> = events
        .iter()
        .map(|event| match event {
            ServerEvent::TypingStart(e) => (e.chat_id.clone(), e.channel_id.clone()),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(
        rooms,
        vec![(Some(chat.id.clone()), None), (None, Some(channel.id.clone()))]
    );
    assert!(app.state.typing.is_typing(&RoomId::Chat(chat.id.clone()), &alice.id));
    assert!(app.state.typing.is_typing(&RoomId::Channel(channel.id), &alice.id));
}

#[tokio::test]
async fn sending_clears_the_indicator() {
    let app = TestApp::new();
    let (chat, a, mut b) = joined(&app).await;

    a.send(ClientIntent::TypingStart(typing(&chat))).await;
    a.send(ClientIntent::MessageSend(SendMessagePayload {
        chat_id: chat.id.clone(),
        content: "done typing".into(),
        reply_to_id: None,
        client_ref: None,
    }))
    .await;

    assert_eq!(
        b.drain_names(),
        vec!["typing:start", "typing:stop", "message:receive", "message:status"]
    );
}

#[tokio::test]
async fn disconnect_clears_the_indicator() {
    let app = TestApp::new();
    let (chat, a, mut b) = joined(&app).await;

    a.send(ClientIntent::TypingStart(typing(&chat))).await;
    a.disconnect().await;

    assert_eq!(
        b.drain_names(),
        vec!["typing:start", "typing:stop", "user:offline"]
    );
}

#[tokio::test]
async fn stale_indicators_expire() {
    let mut settings = test_settings();
    settings.realtime.typing_ttl_secs = 1;
    let app = TestApp::with_settings(settings, |repos| repos);
    let (chat, a, mut b) = joined(&app).await;

    a.send(ClientIntent::TypingStart(typing(&chat))).await;
    assert_eq!(app.state.fanout.expire_typing(), 0);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(app.state.fanout.expire_typing(), 1);
    assert_eq!(b.drain_names(), vec!["typing:start", "typing:stop"]);

    // Nothing left to expire or stop.
    assert_eq!(app.state.fanout.expire_typing(), 0);
    a.send(ClientIntent::TypingStop(typing(&chat))).await;
    assert!(b.drain().is_empty());
}
