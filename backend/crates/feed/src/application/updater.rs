//! Optimistic Post Updater
//!
//! No lock is held between reading a post and writing it back. The write is
//! conditional on the version the caller read; if anyone else wrote first,
//! nothing changes and the caller gets [`FeedError::VersionConflict`].
//! A conflict means "re-read", never "send the same write again".

use std::sync::Arc;

use kernel::id::PostId;

use crate::domain::entities::{Post, PostFields};
use crate::domain::repository::PostRepository;
use crate::error::{FeedError, FeedResult};

pub struct OptimisticPostUpdater<P> {
    posts: Arc<P>,
}

impl<P: PostRepository> OptimisticPostUpdater<P> {
    pub fn new(posts: Arc<P>) -> Self {
        Self { posts }
    }

    /// Single conditional write at `observed_version`
    ///
    /// A missing post and a stale version both yield `VersionConflict`.
    pub async fn update(
        &self,
        post_id: &PostId,
        observed_version: i32,
        fields: &PostFields,
    ) -> FeedResult<Post> {
        match self
            .posts
            .update_if_version(post_id, observed_version, fields)
            .await?
        {
            Some(post) => {
                tracing::debug!(post_id = %post_id, version = post.version, "post updated");
                Ok(post)
            }
            None => {
                tracing::info!(post_id = %post_id, observed_version, "post update lost the race");
                Err(FeedError::VersionConflict)
            }
        }
    }

    /// Re-read and re-apply `change` until a write lands
    ///
    /// `change` sees the freshest post on every attempt. Gives up with
    /// `VersionConflict` after `max_attempts`, or `NotFound` once the post
    /// is gone.
    pub async fn update_with_retry<F>(
        &self,
        post_id: &PostId,
        max_attempts: u32,
        change: F,
    ) -> FeedResult<Post>
    where
        F: Fn(&Post) -> FeedResult<PostFields>,
    {
        for attempt in 1..=max_attempts {
            let current = self
                .posts
                .find_by_id(post_id)
                .await?
                .ok_or(FeedError::NotFound)?;
            let fields = change(&current)?;

            match self.update(post_id, current.version, &fields).await {
                Err(FeedError::VersionConflict) => {
                    tracing::debug!(post_id = %post_id, attempt, "retrying with fresh version");
                }
                result => return result,
            }
        }

        Err(FeedError::VersionConflict)
    }
}
