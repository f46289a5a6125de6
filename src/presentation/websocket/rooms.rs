//! Room Membership Router
//!
//! Tracks which connections are joined to which rooms. Joining only makes a
//! connection reachable for a room's events; who may join is decided by the
//! fan-out engine against durable membership.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::domain::value_objects::{ConnectionId, RoomId};

#[derive(Debug, Default)]
pub struct RoomRouter {
    /// Room to joined connections
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    /// Connection to joined rooms, for cleanup on disconnect
    joined: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the connection was already joined.
    pub fn join(&self, connection_id: &ConnectionId, room: &RoomId) -> bool {
        self.joined
            .entry(connection_id.clone())
            .or_default()
            .insert(room.clone());
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id.clone())
    }

    /// Returns `false` if the connection was not joined.
    pub fn leave(&self, connection_id: &ConnectionId, room: &RoomId) -> bool {
        if let Some(mut rooms) = self.joined.get_mut(connection_id) {
            rooms.remove(room);
        }
        self.joined.remove_if(connection_id, |_, rooms| rooms.is_empty());

        let removed = self
            .rooms
            .get_mut(room)
            .map(|mut members| members.remove(connection_id))
            .unwrap_or(false);
        self.rooms.remove_if(room, |_, members| members.is_empty());
        removed
    }

    /// Drop every membership of a connection. Returns the rooms it was in.
    pub fn leave_all(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let Some((_, rooms)) = self.joined.remove(connection_id) else {
            return Vec::new();
        };
        for room in &rooms {
            if let Some(mut members) = self.rooms.get_mut(room) {
                members.remove(connection_id);
            }
            self.rooms.remove_if(room, |_, members| members.is_empty());
        }
        rooms.into_iter().collect()
    }

    /// Connections currently joined to `room`.
    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_joined(&self, connection_id: &ConnectionId, room: &RoomId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(connection_id))
    }

    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.joined
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }
}
