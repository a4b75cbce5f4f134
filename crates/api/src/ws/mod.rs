//! WebSocket plumbing for the live execution feed.
//!
//! Dashboard clients subscribe at `/ws/executions` and receive one JSON
//! message per webhook delivery attempt.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::executions_feed_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
