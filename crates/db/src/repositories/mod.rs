//! Repository pattern: unit structs with associated async fns over
//! `&PgPool`.

mod user_repo;
mod webhook_repo;

pub use user_repo::UserRepo;
pub use webhook_repo::WebhookRepo;
