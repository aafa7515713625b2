//! PostgreSQL Repository Implementations

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};
use platform::deadline::{STORE_DEADLINE, with_deadline};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Post, PostFields};
use crate::domain::repository::PostRepository;
use crate::error::FeedResult;

/// PostgreSQL-backed post repository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
    deadline: Duration,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            deadline: STORE_DEADLINE,
        }
    }

    async fn timed<T>(&self, call: impl Future<Output = FeedResult<T>>) -> FeedResult<T> {
        with_deadline(self.deadline, call).await?
    }
}

impl PostRepository for PgPostRepository {
    async fn create(&self, post: &Post) -> FeedResult<()> {
        self.timed(async {
            sqlx::query(
                r#"
                INSERT INTO posts (
                    id,
                    owner_id,
                    title,
                    content,
                    tags,
                    version,
                    created_at,
                    updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(post.post_id.as_uuid())
            .bind(post.owner_id.as_uuid())
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.tags)
            .bind(post.version)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, post_id: &PostId) -> FeedResult<Option<Post>> {
        self.timed(async {
            let row = sqlx::query_as::<_, PostRow>(
                r#"
                SELECT id, owner_id, title, content, tags, version, created_at, updated_at
                FROM posts
                WHERE id = $1
                "#,
            )
            .bind(post_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(PostRow::into_post))
        })
        .await
    }

    async fn update_if_version(
        &self,
        post_id: &PostId,
        expected_version: i32,
        fields: &PostFields,
    ) -> FeedResult<Option<Post>> {
        self.timed(async {
            let row = sqlx::query_as::<_, PostRow>(
                r#"
                UPDATE posts SET
                    title = $3,
                    content = $4,
                    tags = $5,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $1 AND version = $2
                RETURNING id, owner_id, title, content, tags, version, created_at, updated_at
                "#,
            )
            .bind(post_id.as_uuid())
            .bind(expected_version)
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.tags)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(PostRow::into_post))
        })
        .await
    }

    async fn delete(&self, post_id: &PostId) -> FeedResult<bool> {
        self.timed(async {
            let result = sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(post_id.as_uuid())
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    content: String,
    tags: Vec<String>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            post_id: PostId::from_uuid(self.id),
            owner_id: UserId::from_uuid(self.owner_id),
            title: self.title,
            content: self.content,
            tags: self.tags,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
