//! Feed Router

use auth::domain::repository::{RoleRepository, UserCache, UserRepository};
use auth::middleware::require_session;
use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::repository::PostRepository;
use crate::presentation::handlers::{self, FeedAppState};

/// Routes under `/v1/posts`, all behind a session
pub fn feed_router<P, R, C>(state: FeedAppState<P, R, C>) -> Router
where
    P: PostRepository + Send + Sync + 'static,
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let guard = state.guard.clone();

    Router::new()
        .route("/", post(handlers::create::<P, R, C>))
        .route(
            "/{id}",
            get(handlers::get::<P, R, C>)
                .patch(handlers::update::<P, R, C>)
                .delete(handlers::delete::<P, R, C>),
        )
        .route_layer(middleware::from_fn_with_state(guard, require_session::<R, C>))
        .with_state(state)
}
