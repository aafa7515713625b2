//! In-memory post store
//!
//! The version check and the write happen under one lock, which gives the
//! same atomicity as the conditional `UPDATE`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use kernel::id::PostId;

use crate::domain::entities::{Post, PostFields};
use crate::domain::repository::PostRepository;
use crate::error::{FeedError, FeedResult};

#[derive(Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<Mutex<HashMap<PostId, Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn posts(&self) -> FeedResult<MutexGuard<'_, HashMap<PostId, Post>>> {
        self.posts
            .lock()
            .map_err(|_| FeedError::Internal("post store lock poisoned".to_string()))
    }
}

impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: &Post) -> FeedResult<()> {
        self.posts()?.insert(post.post_id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, post_id: &PostId) -> FeedResult<Option<Post>> {
        Ok(self.posts()?.get(post_id).cloned())
    }

    async fn update_if_version(
        &self,
        post_id: &PostId,
        expected_version: i32,
        fields: &PostFields,
    ) -> FeedResult<Option<Post>> {
        let mut posts = self.posts()?;
        let Some(post) = posts
            .get_mut(post_id)
            .filter(|p| p.version == expected_version)
        else {
            return Ok(None);
        };

        post.title = fields.title.clone();
        post.content = fields.content.clone();
        post.tags = fields.tags.clone();
        post.version += 1;
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    async fn delete(&self, post_id: &PostId) -> FeedResult<bool> {
        Ok(self.posts()?.remove(post_id).is_some())
    }
}
