//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::PostId;

use crate::domain::entities::{Post, PostFields};
use crate::error::FeedResult;

/// Post store
#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    async fn create(&self, post: &Post) -> FeedResult<()>;

    async fn find_by_id(&self, post_id: &PostId) -> FeedResult<Option<Post>>;

    /// Set `fields` and bump the version, only where the stored version
    /// still equals `expected_version`.
    ///
    /// `None` when no row matched: the post is gone or was changed since it
    /// was read.
    async fn update_if_version(
        &self,
        post_id: &PostId,
        expected_version: i32,
        fields: &PostFields,
    ) -> FeedResult<Option<Post>>;

    /// Returns whether a row was removed
    async fn delete(&self, post_id: &PostId) -> FeedResult<bool>;
}
