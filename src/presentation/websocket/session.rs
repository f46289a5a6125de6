//! WebSocket Session Management

use std::time::{Duration, Instant};

use crate::domain::value_objects::{ConnectionId, UserId};

/// Per-connection state owned by the reader loop
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    /// Frames received so far, pongs included
    pub frames: u64,
    pub last_activity: Instant,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId, user_id: UserId) -> Self {
        Self {
            connection_id,
            user_id,
            frames: 0,
            last_activity: Instant::now(),
        }
    }

    /// Any inbound frame counts as a sign of life.
    pub fn touch(&mut self) {
        self.frames += 1;
        self.last_activity = Instant::now();
    }

    pub fn is_alive(&self, idle_timeout: Duration) -> bool {
        self.last_activity.elapsed() < idle_timeout
    }
}
