//! WebSocket Gateway
//!
//! Real-time delivery over WebSocket connections.
//!
//! - [`presence`]: identity to live connections
//! - [`rooms`]: room membership of connections
//! - [`gateway`]: connection registry and event delivery
//! - [`fanout`]: intent handling and recipient selection
//! - [`messages`]: wire protocol
//! - [`handler`]: upgrade, authentication and the per-connection loop

pub mod fanout;
pub mod gateway;
pub mod handler;
pub mod messages;
pub mod presence;
pub mod rooms;
pub mod session;

pub use fanout::FanoutEngine;
pub use gateway::{ConnectedSession, EventSender, Gateway};
pub use handler::ws_handler;
pub use messages::{ClientIntent, MessageEnvelope, ServerEvent};
pub use presence::PresenceRegistry;
pub use rooms::RoomRouter;
pub use session::SessionState;
