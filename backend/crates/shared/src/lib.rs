//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by the
//! access-control pipeline and the feed:
//! - The error taxonomy (`ErrorKind`) and the unified `AppError`
//! - Typed entity identifiers (`UserId`, `PostId`)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
