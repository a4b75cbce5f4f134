//! HTTP handlers: broker decision endpoints, health, and the admin
//! surface for users and webhooks.

pub mod broker;
pub mod health;
pub mod users;
pub mod webhooks;
