//! Password hashing and verification.

pub mod password;
