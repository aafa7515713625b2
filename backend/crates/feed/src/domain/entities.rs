//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};

pub const TITLE_MAX_LENGTH: usize = 100;
pub const CONTENT_MAX_LENGTH: usize = 1000;
pub const MAX_TAGS: usize = 10;

/// A post in the feed
///
/// `version` starts at 1 and grows by exactly one per successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub post_id: PostId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub const INITIAL_VERSION: i32 = 1;

    pub fn new(owner_id: UserId, fields: PostFields) -> Self {
        let now = Utc::now();
        Self {
            post_id: PostId::new(),
            owner_id,
            title: fields.title,
            content: fields.content,
            tags: fields.tags,
            version: Self::INITIAL_VERSION,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn fields(&self) -> PostFields {
        PostFields {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Editable content of a post, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Field validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl PostFields {
    pub fn new(title: String, content: String, tags: Vec<String>) -> Result<Self, FieldError> {
        let title = title.trim().to_string();
        let content = content.trim().to_string();

        check_length("title", &title, TITLE_MAX_LENGTH)?;
        check_length("content", &content, CONTENT_MAX_LENGTH)?;

        if tags.len() > MAX_TAGS {
            return Err(FieldError {
                field: "tags",
                message: format!("at most {MAX_TAGS} tags"),
            });
        }
        let tags = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            title,
            content,
            tags,
        })
    }

    /// Overlay the provided values onto `self`, then re-validate
    pub fn patched(
        self,
        title: Option<String>,
        content: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Self, FieldError> {
        Self::new(
            title.unwrap_or(self.title),
            content.unwrap_or(self.content),
            tags.unwrap_or(self.tags),
        )
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), FieldError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(FieldError {
            field,
            message: "must not be empty".to_string(),
        });
    }
    if len > max {
        return Err(FieldError {
            field,
            message: format!("must be at most {max} characters"),
        });
    }
    Ok(())
}

impl From<FieldError> for crate::error::FeedError {
    fn from(err: FieldError) -> Self {
        crate::error::FeedError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_starts_at_version_one() {
        let fields = PostFields::new("hello".into(), "world".into(), vec![]).unwrap();
        let post = Post::new(UserId::new(), fields);
        assert_eq!(post.version, 1);
    }

    #[test]
    fn test_field_limits() {
        assert!(PostFields::new("".into(), "body".into(), vec![]).is_err());
        assert!(PostFields::new("t".repeat(TITLE_MAX_LENGTH + 1), "body".into(), vec![]).is_err());
        assert!(PostFields::new("t".into(), "c".repeat(CONTENT_MAX_LENGTH), vec![]).is_ok());
        assert!(PostFields::new("t".into(), "c".into(), vec!["x".into(); MAX_TAGS + 1]).is_err());
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let fields = PostFields::new("title".into(), "content".into(), vec!["a".into()]).unwrap();
        let patched = fields.patched(None, Some("edited".into()), None).unwrap();
        assert_eq!(patched.title, "title");
        assert_eq!(patched.content, "edited");
        assert_eq!(patched.tags, vec!["a".to_string()]);
    }
}
