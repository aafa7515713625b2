//! Domain Layer
//!
//! Contains entities, value objects, the access decision table,
//! and repository traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{invitation::Invitation, role::Role, user::Principal, user::User};
pub use policy::{AccessDecision, AccessGrant, decide};
pub use repository::{RoleRepository, UserCache, UserRepository};
