//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use notify::Notifier;

use crate::domain::repository::{RoleRepository, UserCache, UserRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_session;

/// Routes under `/v1/auth`
pub fn auth_router<R, C, N>(state: AuthAppState<R, C, N>) -> Router
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let session = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state.guard.clone(),
            require_session::<R, C>,
        ));

    Router::new()
        .route("/register", post(handlers::register::<R, C, N>))
        .route("/activate", post(handlers::activate::<R, C, N>))
        .route("/login", post(handlers::login::<R, C, N>))
        .route("/logout", post(handlers::logout::<R, C, N>))
        .with_state(state)
        .merge(session)
}
