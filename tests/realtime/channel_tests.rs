//! Channel broadcast

use pretty_assertions::assert_eq;

use chat_relay::presentation::websocket::messages::ChannelMessagePayload;
use chat_relay::presentation::websocket::ClientIntent;

use crate::common::{error_messages, received_messages, TestApp};

fn post(channel_id: &chat_relay::domain::value_objects::ChannelId, content: &str) -> ClientIntent {
    ClientIntent::ChannelMessageSend(ChannelMessagePayload {
        channel_id: channel_id.clone(),
        content: content.into(),
        client_ref: None,
    })
}

#[tokio::test]
async fn member_cannot_post() {
    let app = TestApp::new();
    let u1 = app.create_user("u1").await;
    let u2 = app.create_user("u2").await;
    let channel = app.create_channel(&u1, "ch1", &[&u2]).await;
    assert_eq!(channel.admin_ids, vec![u1.id.clone()]);

    let mut owner = app.connect(&u1).await;
    let mut member = app.connect(&u2).await;
    owner.send(ClientIntent::ChannelJoin(channel.id.clone())).await;
    member.send(ClientIntent::ChannelJoin(channel.id.clone())).await;
    owner.drain();
    member.drain();

    member.send(post(&channel.id, "let me in")).await;

    assert_eq!(
        error_messages(&member.drain()),
        vec!["Only admins can send messages in this channel".to_string()]
    );
    assert!(owner.drain().is_empty());
    assert!(app.channel_messages(&channel.id).await.is_empty());
}

#[tokio::test]
async fn admin_post_reaches_joined_connections() {
    let app = TestApp::new();
    let u1 = app.create_user("u1").await;
    let u2 = app.create_user("u2").await;
    let outsider = app.create_user("outsider").await;
    let channel = app.create_channel(&u1, "news", &[&u2]).await;

    let mut owner = app.connect(&u1).await;
    let mut member = app.connect(&u2).await;
    let mut reader = app.connect(&outsider).await;
    for client in [&owner, &member, &reader] {
        client.send(ClientIntent::ChannelJoin(channel.id.clone())).await;
    }
    owner.drain();
    member.drain();
    reader.drain();

    owner.send(post(&channel.id, "hello subscribers")).await;

    // Joining a channel room only needs the channel to exist.
    for client in [&mut owner, &mut member, &mut reader] {
        let events = client.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name(), "channel:message:receive");
        assert_eq!(received_messages(&events)[0].content, "hello subscribers");
    }
}

#[tokio::test]
async fn joining_unknown_channel_is_not_found() {
    let app = TestApp::new();
    let u1 = app.create_user("u1").await;
    let mut client = app.connect(&u1).await;

    client
        .send(ClientIntent::ChannelJoin(chat_relay::domain::value_objects::ChannelId::new("nope")))
        .await;

    assert_eq!(error_messages(&client.drain()), vec!["Channel not found".to_string()]);
}

#[tokio::test]
async fn chat_and_channel_rooms_do_not_collide() {
    let app = TestApp::new();
    let u1 = app.create_user("u1").await;
    let u2 = app.create_user("u2").await;
    let channel = app.create_channel(&u1, "samename", &[]).await;

    // A chat whose id happens to equal the channel id.
    let chat = chat_relay::domain::entities::Chat {
        id: chat_relay::domain::value_objects::ChatId::new(channel.id.as_str()),
        ..chat_relay::domain::entities::Chat::new(u1.id.clone(), u2.id.clone())
    };
    app.state.repos.chats.create(&chat).await.unwrap();

    let mut in_chat = app.connect(&u2).await;
    in_chat.send(ClientIntent::ChatJoin(chat.id.clone())).await;
    in_chat.drain();

    let owner = app.connect(&u1).await;
    owner.send(ClientIntent::ChannelJoin(channel.id.clone())).await;
    owner.send(post(&channel.id, "channel only")).await;

    assert!(received_messages(&in_chat.drain()).is_empty());
}
