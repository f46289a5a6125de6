//! Presence transitions

use pretty_assertions::assert_eq;

use chat_relay::presentation::websocket::ServerEvent;

use crate::common::TestApp;

fn offline_events(events: &[ServerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ServerEvent::UserOffline(_)))
        .count()
}

#[tokio::test]
async fn single_connection_round_trip() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let mut watcher = app.connect(&bob).await;

    assert!(!app.state.gateway.is_user_online(&alice.id));
    let a = app.connect(&alice).await;
    assert!(app.state.gateway.is_user_online(&alice.id));
    assert_eq!(watcher.drain_names(), vec!["user:online"]);

    a.disconnect().await;
    assert!(!app.state.gateway.is_user_online(&alice.id));

    let events = watcher.drain();
    assert_eq!(offline_events(&events), 1);
    let ServerEvent::UserOffline(offline) = &events[0] else {
        panic!("expected user:offline");
    };
    assert_eq!(offline.user_id, alice.id);
    assert!(offline.last_seen.is_some());

    let profile = app.state.repos.users.find_by_id(&alice.id).await.unwrap().unwrap();
    assert!(!profile.is_online);
}

#[tokio::test]
async fn second_connection_does_not_reannounce() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let mut watcher = app.connect(&bob).await;

    let first = app.connect(&alice).await;
    let second = app.connect(&alice).await;
    assert_eq!(watcher.drain_names(), vec!["user:online"]);

    first.disconnect().await;
    assert!(app.state.gateway.is_user_online(&alice.id));
    assert!(watcher.drain().is_empty());

    second.disconnect().await;
    assert_eq!(watcher.drain_names(), vec!["user:offline"]);
}

#[tokio::test]
async fn subject_does_not_hear_its_own_presence() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let mut a = app.connect(&alice).await;
    let other_tab = app.connect(&alice).await;
    other_tab.disconnect().await;

    assert!(a.drain().is_empty());
}

#[tokio::test]
async fn disconnect_twice_is_harmless() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let mut watcher = app.connect(&bob).await;
    let a = app.connect(&alice).await;
    watcher.drain();

    a.disconnect().await;
    a.disconnect().await;

    assert_eq!(offline_events(&watcher.drain()), 1);
    assert_eq!(app.state.gateway.session_count(), 1);
}

#[tokio::test]
async fn disconnect_leaves_every_room() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let chat = app.open_chat(&alice, &bob).await;
    let a = app.connect(&alice).await;
    a.send(chat_relay::presentation::websocket::ClientIntent::ChatJoin(chat.id.clone()))
        .await;
    assert_eq!(app.state.gateway.rooms().members(&chat.room()).len(), 1);

    a.disconnect().await;

    assert!(app.state.gateway.rooms().members(&chat.room()).is_empty());
}

#[tokio::test]
async fn concurrent_churn_settles_offline() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let mut watcher = app.connect(&bob).await;

    let mut clients = Vec::new();
    for _ in 0..8 {
        clients.push(app.connect(&alice).await);
    }
    let handles: Vec<_> = clients
        .into_iter()
        .map(|client| tokio::spawn(async move { client.disconnect().await }))
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(!app.state.gateway.is_user_online(&alice.id));
    assert_eq!(watcher.drain_names(), vec!["user:online", "user:offline"]);
}

#[tokio::test]
async fn offline_identities_release_their_presence_lock() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let a = app.connect(&alice).await;
    let b = app.connect(&bob).await;
    assert_eq!(app.state.fanout.tracked_identities(), 2);

    a.disconnect().await;
    assert_eq!(app.state.fanout.tracked_identities(), 1);

    let again = app.connect(&alice).await;
    again.disconnect().await;
    b.disconnect().await;
    assert_eq!(app.state.fanout.tracked_identities(), 0);
}
