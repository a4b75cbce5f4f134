//! The connect/publish/subscribe decision engine.

mod decision;
mod store;

pub use decision::{AuthDecisionEngine, Decision, DenyReason};
pub use store::{CachedAuthResult, CredentialStore, PgCredentialStore};
