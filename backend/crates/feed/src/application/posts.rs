//! Post Use Cases
//!
//! Create, read and delete. Updates go through
//! [`OptimisticPostUpdater`](crate::application::updater::OptimisticPostUpdater).

use std::sync::Arc;

use kernel::id::{PostId, UserId};

use crate::domain::entities::{Post, PostFields};
use crate::domain::repository::PostRepository;
use crate::error::{FeedError, FeedResult};

pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

pub struct PostUseCases<P> {
    posts: Arc<P>,
}

impl<P: PostRepository> PostUseCases<P> {
    pub fn new(posts: Arc<P>) -> Self {
        Self { posts }
    }

    pub async fn create(&self, owner_id: UserId, input: CreatePostInput) -> FeedResult<Post> {
        let fields = PostFields::new(input.title, input.content, input.tags)?;
        let post = Post::new(owner_id, fields);

        self.posts.create(&post).await?;

        tracing::info!(post_id = %post.post_id, owner_id = %owner_id, "post created");
        Ok(post)
    }

    pub async fn get(&self, post_id: &PostId) -> FeedResult<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(FeedError::NotFound)
    }

    pub async fn delete(&self, post_id: &PostId) -> FeedResult<()> {
        if !self.posts.delete(post_id).await? {
            return Err(FeedError::NotFound);
        }

        tracing::info!(post_id = %post_id, "post deleted");
        Ok(())
    }
}
