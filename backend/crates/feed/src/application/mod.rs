//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod posts;
pub mod updater;

pub use config::FeedConfig;
pub use posts::{CreatePostInput, PostUseCases};
pub use updater::OptimisticPostUpdater;
