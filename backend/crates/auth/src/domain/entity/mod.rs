//! Entities

pub mod invitation;
pub mod role;
pub mod user;
