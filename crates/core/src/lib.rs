//! Pure domain logic shared by every mqguard crate.
//!
//! Nothing in here performs I/O: topic ACL matching, event-type tags,
//! password fingerprinting, and the domain error type.

pub mod acl;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod types;
