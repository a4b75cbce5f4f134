//! Row structs and DTOs.

pub mod user;
pub mod webhook;
