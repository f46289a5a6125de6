//! Typing Indicator Cache
//!
//! In-process typing indicators with a TTL. An indicator that is not
//! refreshed within the TTL is considered stale and is reaped by
//! [`TypingCacheService::sweep_expired`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::value_objects::{RoomId, UserId};

/// Default indicator lifetime, in seconds.
pub const DEFAULT_TYPING_TTL_SECS: u64 = 10;

/// Typing indicator cache service
#[derive(Debug)]
pub struct TypingCacheService {
    rooms: DashMap<RoomId, HashMap<UserId, Instant>>,
    typing_ttl: Duration,
}

impl Default for TypingCacheService {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingCacheService {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TYPING_TTL_SECS))
    }

    /// Create with custom TTL
    pub fn with_ttl(typing_ttl: Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            typing_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.typing_ttl
    }

    /// Mark `user_id` as typing in `room`, refreshing the deadline.
    ///
    /// Returns `true` if the user was not already typing there.
    pub fn set_typing(&self, room: &RoomId, user_id: &UserId) -> bool {
        self.set_typing_at(room, user_id, Instant::now())
    }

    fn set_typing_at(&self, room: &RoomId, user_id: &UserId, now: Instant) -> bool {
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(user_id.clone(), now)
            .is_none()
    }

    pub fn is_typing(&self, room: &RoomId, user_id: &UserId) -> bool {
        self.rooms
            .get(room)
            .and_then(|users| users.get(user_id).copied())
            .is_some_and(|since| since.elapsed() < self.typing_ttl)
    }

    /// Users currently typing in a room, stale entries excluded.
    pub fn get_typing_users(&self, room: &RoomId) -> Vec<UserId> {
        let Some(users) = self.rooms.get(room) else {
            return Vec::new();
        };
        let mut active: Vec<UserId> = users
            .iter()
            .filter(|(_, since)| since.elapsed() < self.typing_ttl)
            .map(|(user, _)| user.clone())
            .collect();
        active.sort();
        active
    }

    /// Clear one indicator. Returns `true` if the user was marked typing.
    pub fn clear_typing(&self, room: &RoomId, user_id: &UserId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut users) => users.remove(user_id).is_some(),
            None => false,
        };
        self.rooms.remove_if(room, |_, users| users.is_empty());
        removed
    }

    /// Clear every indicator held by a user. Returns the rooms affected.
    pub fn clear_user(&self, user_id: &UserId) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .rooms
            .iter_mut()
            .filter_map(|mut entry| entry.value_mut().remove(user_id).map(|_| entry.key().clone()))
            .collect();
        self.rooms.retain(|_, users| !users.is_empty());
        rooms.sort();
        rooms
    }

    /// Clear all typing indicators in a room
    pub fn clear_room(&self, room: &RoomId) {
        self.rooms.remove(room);
    }

    /// Remove indicators older than the TTL and return them.
    pub fn sweep_expired(&self) -> Vec<(RoomId, UserId)> {
        self.sweep_expired_at(Instant::now())
    }

    fn sweep_expired_at(&self, now: Instant) -> Vec<(RoomId, UserId)> {
        let mut expired = Vec::new();
        for mut entry in self.rooms.iter_mut() {
            let room = entry.key().clone();
            entry.value_mut().retain(|user, since| {
                let alive = now.saturating_duration_since(*since) < self.typing_ttl;
                if !alive {
                    expired.push((room.clone(), user.clone()));
                }
                alive
            });
        }
        self.rooms.retain(|_, users| !users.is_empty());
        expired
    }
}
