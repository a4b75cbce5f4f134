//! mqguard HTTP sidecar: broker decision endpoints, the auth decision
//! engine, the webhook trigger engine, and the execution-status
//! WebSocket feed.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod query;
pub mod response;
pub mod routes;
pub mod state;
pub mod trigger;
pub mod ws;
