//! WebSocket Gateway
//!
//! Owns the live connections and the two routing tables (presence and room
//! membership) and delivers [`ServerEvent`]s to connection queues. Delivery
//! is fire-and-forget: a closed queue means the connection is going away and
//! its cleanup will run on its own task.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::messages::ServerEvent;
use super::presence::PresenceRegistry;
use super::rooms::RoomRouter;
use crate::domain::value_objects::{ConnectionId, RoomId, UserId};
use crate::infrastructure::metrics;

/// Outbound queue of one connection
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Connected session with message sender
#[derive(Debug)]
pub struct ConnectedSession {
    pub connection_id: ConnectionId,
    /// Bound at handshake, never changes
    pub user_id: UserId,
    pub sender: EventSender,
}

/// WebSocket gateway managing all connections
#[derive(Debug, Default)]
pub struct Gateway {
    sessions: DashMap<ConnectionId, Arc<ConnectedSession>>,
    presence: PresenceRegistry,
    rooms: RoomRouter,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn rooms(&self) -> &RoomRouter {
        &self.rooms
    }

    /// Register a new connected session.
    ///
    /// Presence is not touched here; the engine does that under the
    /// identity's transition lock.
    pub fn register_session(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: EventSender,
    ) -> Arc<ConnectedSession> {
        let session = Arc::new(ConnectedSession {
            connection_id: connection_id.clone(),
            user_id,
            sender,
        });
        self.sessions.insert(connection_id.clone(), session.clone());

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %session.user_id,
            "Session registered"
        );
        self.update_gauges();
        session
    }

    /// Unregister a session and drop all its room memberships.
    ///
    /// Returns the session and the rooms it had joined.
    pub fn unregister_session(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<(Arc<ConnectedSession>, Vec<RoomId>)> {
        let (_, session) = self.sessions.remove(connection_id)?;
        let rooms = self.rooms.leave_all(connection_id);

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %session.user_id,
            rooms = rooms.len(),
            "Session unregistered"
        );
        self.update_gauges();
        Some((session, rooms))
    }

    pub fn session(&self, connection_id: &ConnectionId) -> Option<Arc<ConnectedSession>> {
        self.sessions.get(connection_id).map(|s| s.value().clone())
    }

    /// Send an event directly to one connection.
    pub fn send_to_connection(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        let Some(session) = self.session(connection_id) else {
            return false;
        };
        self.deliver(&session, event)
    }

    /// Send to every connection of a user.
    pub fn send_to_user(&self, user_id: &UserId, event: &ServerEvent) -> usize {
        self.presence
            .connections_of(user_id)
            .iter()
            .filter_map(|id| self.session(id))
            .filter(|session| self.deliver(session, event.clone()))
            .count()
    }

    /// Send to every connection joined to `room`, optionally skipping the
    /// originating connection.
    pub fn send_to_room(
        &self,
        room: &RoomId,
        event: &ServerEvent,
        except: Option<&ConnectionId>,
    ) -> usize {
        self.rooms
            .members(room)
            .iter()
            .filter(|id| except != Some(*id))
            .filter_map(|id| self.session(id))
            .filter(|session| self.deliver(session, event.clone()))
            .count()
    }

    /// Send to the joined connections of `room` plus every connection of
    /// `users`, each connection at most once.
    pub fn send_to_room_and_users(&self, room: &RoomId, users: &[UserId], event: &ServerEvent) -> usize {
        let mut targets: HashSet<ConnectionId> = self.rooms.members(room).into_iter().collect();
        for user_id in users {
            targets.extend(self.presence.connections_of(user_id));
        }
        targets
            .iter()
            .filter_map(|id| self.session(id))
            .filter(|session| self.deliver(session, event.clone()))
            .count()
    }

    /// Send to every live connection, optionally skipping one user.
    pub fn broadcast(&self, event: &ServerEvent, except: Option<&UserId>) -> usize {
        let sessions: Vec<Arc<ConnectedSession>> =
            self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions
            .iter()
            .filter(|session| except != Some(&session.user_id))
            .filter(|session| self.deliver(session, event.clone()))
            .count()
    }

    /// Get session count
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Check if user is online (has at least one session)
    pub fn is_user_online(&self, user_id: &UserId) -> bool {
        self.presence.is_online(user_id)
    }

    pub fn update_gauges(&self) {
        metrics::set_realtime_gauges(self.sessions.len(), self.presence.online_count());
    }

    fn deliver(&self, session: &ConnectedSession, event: ServerEvent) -> bool {
        let name = event.event_name();
        match session.sender.send(event) {
            Ok(()) => {
                metrics::record_event(name);
                true
            }
            Err(_) => {
                tracing::trace!(
                    connection_id = %session.connection_id,
                    event = name,
                    "Dropped event for closing connection"
                );
                false
            }
        }
    }
}
