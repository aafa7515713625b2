//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Fixed-window admission control (`rate_limit`)
//! - Cryptographic utilities (SHA-256, opaque tokens, Base64)
//! - Password hashing (Argon2id)
//! - Cookie and Basic credential handling
//! - Client identification and deadline helpers

pub mod basic_auth;
pub mod client;
pub mod cookie;
pub mod crypto;
pub mod deadline;
pub mod password;
pub mod rate_limit;
