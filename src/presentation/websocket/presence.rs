//! Presence Registry
//!
//! Process-wide map of identity to live connections. An identity is online
//! iff it has at least one registered connection. Nothing here is durable:
//! after a restart everyone starts offline.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::domain::value_objects::{ConnectionId, UserId};

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    connections: Mutex<HashMap<UserId, HashSet<ConnectionId>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns `true` if it is the identity's first one.
    pub fn register(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        let set = connections.entry(user_id.clone()).or_default();
        let first = set.is_empty();
        set.insert(connection_id.clone());
        first
    }

    /// Remove a connection. Returns `true` if it was the identity's last one.
    ///
    /// Unknown connections are ignored and never report a transition.
    pub fn deregister(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        let Some(set) = connections.get_mut(user_id) else {
            return false;
        };
        if !set.remove(connection_id) {
            return false;
        }
        if set.is_empty() {
            connections.remove(user_id);
            true
        } else {
            false
        }
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.connections
            .lock()
            .get(user_id)
            .is_some_and(|set| !set.is_empty())
    }

    pub fn connections_of(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.connections
            .lock()
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of identities currently online.
    pub fn online_count(&self) -> usize {
        self.connections.lock().len()
    }
}
