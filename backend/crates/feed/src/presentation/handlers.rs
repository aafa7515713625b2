//! HTTP Handlers
//!
//! Every route runs behind `require_session`, so a [`Principal`] is always
//! present. Role and ownership are checked here, after the post is loaded.

use std::sync::Arc;

use auth::application::AccessRequirement;
use auth::domain::repository::{RoleRepository, UserCache, UserRepository};
use auth::{AuthGuard, Principal, Role};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use kernel::id::PostId;

use crate::application::{FeedConfig, OptimisticPostUpdater, PostUseCases};
use crate::domain::entities::Post;
use crate::domain::repository::PostRepository;
use crate::error::{FeedError, FeedResult};
use crate::presentation::dto::{CreatePostRequest, PostResponse, UpdatePostRequest};

/// Shared state for post handlers
pub struct FeedAppState<P, R, C> {
    pub guard: AuthGuard<R, C>,
    pub posts: Arc<PostUseCases<P>>,
    pub updater: Arc<OptimisticPostUpdater<P>>,
    pub config: Arc<FeedConfig>,
}

impl<P, R, C> Clone for FeedAppState<P, R, C> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            posts: Arc::clone(&self.posts),
            updater: Arc::clone(&self.updater),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P, R, C> FeedAppState<P, R, C>
where
    P: PostRepository + Send + Sync + 'static,
{
    pub fn new(store: Arc<P>, guard: AuthGuard<R, C>, config: FeedConfig) -> Self {
        Self {
            guard,
            posts: Arc::new(PostUseCases::new(Arc::clone(&store))),
            updater: Arc::new(OptimisticPostUpdater::new(store)),
            config: Arc::new(config),
        }
    }
}

impl<P, R, C> FeedAppState<P, R, C>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    async fn authorize(
        &self,
        principal: &Principal,
        required_role: &str,
        post: &Post,
    ) -> FeedResult<()> {
        let requirement = AccessRequirement::role(required_role).owned_by(post.owner_id);
        let grant = self.guard.chain.authorize(principal, &requirement).await?;

        tracing::debug!(
            user_id = %principal.id,
            post_id = %post.post_id,
            grant = ?grant,
            "post access granted"
        );
        Ok(())
    }
}

/// POST /v1/posts
pub async fn create<P, R, C>(
    State(state): State<FeedAppState<P, R, C>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreatePostRequest>,
) -> FeedResult<(StatusCode, Json<PostResponse>)>
where
    P: PostRepository + Send + Sync + 'static,
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let post = state.posts.create(principal.id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(&post))))
}

/// GET /v1/posts/{id}
pub async fn get<P, R, C>(
    State(state): State<FeedAppState<P, R, C>>,
    Path(post_id): Path<PostId>,
) -> FeedResult<Json<PostResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let post = state.posts.get(&post_id).await?;
    Ok(Json(PostResponse::from(&post)))
}

/// PATCH /v1/posts/{id}
///
/// With a `version` in the body the write is checked against it and a
/// stale value is a 409. Without one, the patch is re-applied on the
/// freshest post up to `max_update_attempts` times.
pub async fn update<P, R, C>(
    State(state): State<FeedAppState<P, R, C>>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<PostId>,
    Json(req): Json<UpdatePostRequest>,
) -> FeedResult<Json<PostResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let post = state.posts.get(&post_id).await?;
    state.authorize(&principal, Role::MODERATOR, &post).await?;

    let UpdatePostRequest {
        title,
        content,
        tags,
        version,
    } = req;

    let updated = match version {
        Some(observed) => {
            let fields = post.fields().patched(title, content, tags)?;
            state.updater.update(&post_id, observed, &fields).await?
        }
        None => {
            state
                .updater
                .update_with_retry(&post_id, state.config.max_update_attempts, |current| {
                    current
                        .fields()
                        .patched(title.clone(), content.clone(), tags.clone())
                        .map_err(FeedError::from)
                })
                .await?
        }
    };

    Ok(Json(PostResponse::from(&updated)))
}

/// DELETE /v1/posts/{id}
pub async fn delete<P, R, C>(
    State(state): State<FeedAppState<P, R, C>>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<PostId>,
) -> FeedResult<StatusCode>
where
    P: PostRepository + Send + Sync + 'static,
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let post = state.posts.get(&post_id).await?;
    state.authorize(&principal, Role::ADMIN, &post).await?;

    state.posts.delete(&post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
