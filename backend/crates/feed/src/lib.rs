//! Feed (Posts) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Post entity, field rules, repository trait
//! - `application/` - Use cases and the optimistic updater
//! - `infra/` - Postgres and in-memory post stores
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Consistency Model
//! - Posts carry a `version` that starts at 1 and grows by one per write
//! - A write lands only if the stored version still equals the one the caller read
//! - No lock spans the read and the write; a lost race is a 409 edit conflict
//! - Editing needs ownership or `moderator`; deleting needs ownership or `admin`

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::{FeedConfig, OptimisticPostUpdater};
pub use domain::{Post, PostFields};
pub use error::{FeedError, FeedResult};
pub use infra::{InMemoryPostRepository, PgPostRepository};
pub use presentation::{FeedAppState, feed_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
