//! API DTOs (Data Transfer Objects)

use kernel::id::{PostId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::CreatePostInput;
use crate::domain::entities::Post;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreatePostRequest> for CreatePostInput {
    fn from(req: CreatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            tags: req.tags,
        }
    }
}

/// Partial edit; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Version the client last read
    pub version: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: PostId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub version: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.post_id,
            owner_id: post.owner_id,
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
            version: post.version,
            created_at: post.created_at.timestamp_millis(),
            updated_at: post.updated_at.timestamp_millis(),
        }
    }
}
