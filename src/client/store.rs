//! Per-conversation message store with optimistic sends.
//!
//! A provisional message is shown with status `sending` and a local id until
//! the server's copy arrives. The server copy replaces it in place:
//!
//! 1. by correlation token, when the server echoed one back;
//! 2. otherwise by the first provisional message from the same sender with
//!    identical content.
//!
//! Anything that matches neither is appended unless its id is already
//! present, so a redelivered event never duplicates a message.
//!
//! The content fallback cannot tell apart two pending sends with the same
//! text. It replaces them in order, which is only wrong if the server
//! answers out of order.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{ConversationRef, Message, Reaction};
use crate::domain::value_objects::{MessageId, MessageStatus, UserId};
use crate::presentation::websocket::messages::MessageEnvelope;

/// Prefix of locally generated message ids.
pub const PROVISIONAL_ID_PREFIX: &str = "local-";

/// What applying a server message did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// A provisional message was swapped for the server copy.
    Replaced,
    /// The message was new to this store.
    Appended,
    /// The message was already present; nothing changed.
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct ConversationStore {
    conversation: ConversationRef,
    messages: Vec<Message>,
    /// Correlation token to provisional id
    pending: HashMap<String, MessageId>,
}

impl ConversationStore {
    pub fn new(conversation: ConversationRef) -> Self {
        Self {
            conversation,
            messages: Vec::new(),
            pending: HashMap::new(),
        }
    }

    pub fn conversation(&self) -> &ConversationRef {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.status == MessageStatus::Sending)
            .count()
    }

    /// Replace the contents with fetched history. Provisional messages
    /// still in flight are kept at the end.
    pub fn load_history(&mut self, history: Vec<Message>) {
        let provisional: Vec<Message> = self
            .messages
            .drain(..)
            .filter(|m| m.status == MessageStatus::Sending)
            .collect();
        self.messages = history;
        self.messages.extend(provisional);
    }

    /// Render an unsent message immediately. Returns its local id and the
    /// correlation token to send with it.
    pub fn push_provisional(&mut self, sender_id: UserId, content: impl Into<String>) -> (MessageId, String) {
        let client_ref = Uuid::new_v4().to_string();
        let mut message = Message::new(self.conversation.clone(), sender_id, content);
        message.id = MessageId::new(format!("{}{}", PROVISIONAL_ID_PREFIX, client_ref));
        message.status = MessageStatus::Sending;

        let id = message.id.clone();
        self.pending.insert(client_ref.clone(), id.clone());
        self.messages.push(message);
        (id, client_ref)
    }

    /// Drop a provisional message whose send failed. There is no retry;
    /// the user resends.
    pub fn discard_provisional(&mut self, client_ref: &str) -> Option<Message> {
        let id = self.pending.remove(client_ref)?;
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Apply an authoritative message from the server.
    pub fn apply_server_message(&mut self, envelope: MessageEnvelope) -> Reconciled {
        let MessageEnvelope {
            message,
            client_ref,
        } = envelope;

        if self.messages.iter().any(|m| m.id == message.id) {
            return Reconciled::Duplicate;
        }

        let by_token = client_ref
            .as_deref()
            .and_then(|r| self.pending.remove(r))
            .and_then(|id| self.messages.iter().position(|m| m.id == id));

        let index = by_token.or_else(|| {
            self.messages.iter().position(|m| {
                m.status == MessageStatus::Sending
                    && m.sender_id == message.sender_id
                    && m.content == message.content
            })
        });

        match index {
            Some(index) => {
                let replaced_id = self.messages[index].id.clone();
                self.pending.retain(|_, id| *id != replaced_id);
                self.messages[index] = message;
                Reconciled::Replaced
            }
            None => {
                self.messages.push(message);
                Reconciled::Appended
            }
        }
    }

    /// Swap in an edited or deleted copy. Unknown ids are ignored.
    pub fn apply_update(&mut self, message: Message) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => {
                // Keep whichever status is further along.
                let status = existing.status.max(message.status);
                *existing = message;
                existing.status = status;
                true
            }
            None => false,
        }
    }

    /// Move a message's status forward; regressions are ignored.
    pub fn apply_status(&mut self, id: &MessageId, status: MessageStatus) -> bool {
        self.messages
            .iter_mut()
            .find(|m| &m.id == id)
            .is_some_and(|m| m.advance_status(status))
    }

    pub fn apply_reaction_added(&mut self, reaction: Reaction) -> bool {
        let Some(message) = self
            .messages
            .iter_mut()
            .find(|m| m.id == reaction.message_id)
        else {
            return false;
        };
        if message
            .reactions
            .iter()
            .any(|r| r.same_key(&reaction.message_id, &reaction.user_id, &reaction.emoji))
        {
            return false;
        }
        message.reactions.push(reaction);
        true
    }

    pub fn apply_reaction_removed(&mut self, message_id: &MessageId, user_id: &UserId, emoji: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| &m.id == message_id) else {
            return false;
        };
        let before = message.reactions.len();
        message
            .reactions
            .retain(|r| !r.same_key(message_id, user_id, emoji));
        let removed = message.reactions.len() != before;
        if removed {
            message.updated_at = Utc::now();
        }
        removed
    }
}
