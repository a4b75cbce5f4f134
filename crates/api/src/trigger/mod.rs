//! Webhook fan-out: trigger selection, HTTP execution with bounded
//! retry, execution-log persistence, and status notification.

mod engine;
mod notifier;
mod store;
mod template;

pub use engine::WebhookTriggerEngine;
pub use notifier::{ExecutionNotifier, ExecutionUpdate, NoopNotifier, WsNotifier};
pub use store::{ExecutionStore, PgExecutionStore};
pub use template::render_payload;
