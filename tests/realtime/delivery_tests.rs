//! Message fan-out and delivery status

use pretty_assertions::assert_eq;

use chat_relay::domain::entities::{Chat, User};
use chat_relay::domain::value_objects::MessageStatus;
use chat_relay::presentation::websocket::messages::{
    EditMessagePayload, MessageRefPayload, ReactionPayload, SendMessagePayload,
};
use chat_relay::presentation::websocket::{ClientIntent, ServerEvent};

use crate::common::{error_messages, received_messages, statuses, TestApp, TestClient};

struct Pair {
    alice: User,
    bob: User,
    chat: Chat,
}

async fn pair(app: &TestApp) -> Pair {
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    Pair { alice, bob, chat }
}

async fn join(client: &mut TestClient, chat: &Chat) {
    client.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    client.drain();
}

fn send(chat: &Chat, content: &str) -> ClientIntent {
    ClientIntent::MessageSend(SendMessagePayload {
        chat_id: chat.id.clone(),
        content: content.into(),
        reply_to_id: None,
        client_ref: None,
    })
}

#[tokio::test]
async fn send_to_online_peer_is_delivered() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    join(&mut a, &chat).await;
    join(&mut b, &chat).await;

    a.send(send(&chat, "hi")).await;

    let a_events = a.drain();
    let b_events = b.drain();
    assert_eq!(
        a_events.iter().map(ServerEvent::event_name).collect::<Vec<_>>(),
        vec!["message:receive", "message:status"]
    );
    assert_eq!(statuses(&a_events), vec![MessageStatus::Delivered]);
    assert_eq!(received_messages(&b_events).len(), 1);

    let sent = received_messages(&a_events)[0];
    assert_eq!(sent.content, "hi");
    assert_eq!(sent.status, MessageStatus::Sent);

    let stored = app.stored_message(&sent.id).await.unwrap();
    assert_eq!(stored.status, MessageStatus::Delivered);
}

#[tokio::test]
async fn send_to_offline_peer_stays_sent() {
    let app = TestApp::new();
    let Pair { alice, bob: _, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    join(&mut a, &chat).await;

    a.send(send(&chat, "anyone there?")).await;

    let events = a.drain();
    assert!(statuses(&events).is_empty());
    let sent = received_messages(&events)[0];
    assert_eq!(
        app.stored_message(&sent.id).await.unwrap().status,
        MessageStatus::Sent
    );
}

#[tokio::test]
async fn peer_online_without_joining_still_counts_as_delivered() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    join(&mut a, &chat).await;
    b.drain();

    a.send(send(&chat, "ping")).await;

    assert_eq!(statuses(&a.drain()), vec![MessageStatus::Delivered]);
    // Not joined, so nothing reaches bob's connection.
    assert!(b.drain().is_empty());
}

#[tokio::test]
async fn left_connection_receives_nothing() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    join(&mut a, &chat).await;
    join(&mut b, &chat).await;

    b.send(ClientIntent::ChatLeave(chat.id.clone())).await;
    a.send(send(&chat, "after you left")).await;

    assert!(received_messages(&b.drain()).is_empty());
    assert_eq!(received_messages(&a.drain()).len(), 1);
}

#[tokio::test]
async fn every_joined_connection_of_a_user_receives() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut phone = app.connect(&bob).await;
    let mut laptop = app.connect(&bob).await;
    join(&mut a, &chat).await;
    join(&mut phone, &chat).await;
    join(&mut laptop, &chat).await;

    a.send(send(&chat, "both devices")).await;

    assert_eq!(received_messages(&phone.drain()).len(), 1);
    assert_eq!(received_messages(&laptop.drain()).len(), 1);
}

#[tokio::test]
async fn joining_someone_elses_chat_is_forbidden() {
    let app = TestApp::new();
    let Pair { chat, .. } = pair(&app).await;
    let mallory = app.create_user("mallory").await;
    let mut m = app.connect(&mallory).await;

    m.send(ClientIntent::ChatJoin(chat.id.clone())).await;

    assert_eq!(
        error_messages(&m.drain()),
        vec!["You do not have access to this chat".to_string()]
    );
    assert!(!app
        .state
        .gateway
        .rooms()
        .is_joined(&m.connection_id, &chat.room()));
}

#[tokio::test]
async fn status_never_moves_backwards() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    join(&mut a, &chat).await;
    a.send(send(&chat, "read me")).await;
    let id = received_messages(&a.drain())[0].id.clone();

    // Bob fetches the conversation while offline from the socket.
    app.state
        .chat_service
        .get_chat_messages(&chat.id, &bob.id)
        .await
        .unwrap();
    assert_eq!(app.stored_message(&id).await.unwrap().status, MessageStatus::Seen);

    assert!(!app.state.chat_service.mark_delivered(&id).await.unwrap());
    assert_eq!(app.stored_message(&id).await.unwrap().status, MessageStatus::Seen);
}

#[tokio::test]
async fn edit_and_delete_reach_room_and_participants() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    join(&mut a, &chat).await;
    a.send(send(&chat, "typo")).await;
    let id = received_messages(&a.drain())[0].id.clone();
    b.drain();

    a.send(ClientIntent::MessageEdit(EditMessagePayload {
        chat_id: chat.id.clone(),
        message_id: id.clone(),
        content: "fixed".into(),
    }))
    .await;

    // Bob never joined but is a participant.
    let b_events = b.drain();
    let ServerEvent::MessageEdited(edited) = &b_events[0] else {
        panic!("expected message:edited, got {:?}", b_events);
    };
    assert!(edited.is_edited);
    assert_eq!(edited.content, "fixed");
    assert_eq!(a.drain_names(), vec!["message:edited"]);

    let delete = ClientIntent::MessageDelete(MessageRefPayload {
        chat_id: chat.id.clone(),
        message_id: id.clone(),
    });
    a.send(delete.clone()).await;
    a.send(delete).await;

    // Second delete is a silent no-op.
    assert_eq!(a.drain_names(), vec!["message:deleted"]);
    assert!(app.stored_message(&id).await.unwrap().is_deleted);
}

#[tokio::test]
async fn only_the_author_may_edit() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    join(&mut a, &chat).await;
    join(&mut b, &chat).await;
    a.send(send(&chat, "mine")).await;
    let id = received_messages(&a.drain())[0].id.clone();
    b.drain();

    b.send(ClientIntent::MessageEdit(EditMessagePayload {
        chat_id: chat.id.clone(),
        message_id: id,
        content: "yours now".into(),
    }))
    .await;

    assert_eq!(
        error_messages(&b.drain()),
        vec!["You cannot edit this message".to_string()]
    );
    assert!(a.drain().is_empty());
}

#[tokio::test]
async fn reactions_are_idempotent() {
    let app = TestApp::new();
    let Pair { alice, bob, chat } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    let mut b = app.connect(&bob).await;
    join(&mut a, &chat).await;
    join(&mut b, &chat).await;
    a.send(send(&chat, "react to this")).await;
    let id = received_messages(&a.drain())[0].id.clone();
    b.drain();

    let reaction = ReactionPayload {
        chat_id: chat.id.clone(),
        message_id: id.clone(),
        emoji: "👍".into(),
    };
    b.send(ClientIntent::ReactionAdd(reaction.clone())).await;
    b.send(ClientIntent::ReactionAdd(reaction.clone())).await;

    assert_eq!(a.drain_names(), vec!["reaction:added"]);
    let stored = app.state.repos.reactions.find_by_message(&id).await.unwrap();
    assert_eq!(stored.len(), 1);

    b.send(ClientIntent::ReactionRemove(reaction.clone())).await;
    b.send(ClientIntent::ReactionRemove(reaction)).await;

    assert_eq!(a.drain_names(), vec!["reaction:removed"]);
    let b_events = b.drain();
    assert!(error_messages(&b_events).is_empty());
    assert!(app
        .state
        .repos
        .reactions
        .find_by_message(&id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn malformed_frames_are_reported_to_the_sender() {
    let app = TestApp::new();
    let Pair { alice, .. } = pair(&app).await;
    let mut a = app.connect(&alice).await;

    a.send_text(r#"{"event":"message:explode","data":{}}"#).await;
    a.send_text("not json").await;

    assert_eq!(
        error_messages(&a.drain()),
        vec![
            "Unknown or malformed event".to_string(),
            "Unknown or malformed event".to_string()
        ]
    );
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let app = TestApp::new();
    let Pair { alice, chat, .. } = pair(&app).await;
    let mut a = app.connect(&alice).await;
    join(&mut a, &chat).await;

    a.send(send(&chat, "   ")).await;

    let events = a.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ServerEvent::Error(_)));
    assert!(app.chat_messages(&chat.id).await.is_empty());
}
