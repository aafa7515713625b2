//! Router assembly
//!
//! ```text
//! /v1/auth/*    registration, activation, login, logout, me
//! /v1/posts/*   session required, role/ownership checked per post
//! /v1/health    Basic credentials
//! ```
//!
//! Admission control wraps everything, so a throttled client is turned away
//! before any credential is looked at.

use std::sync::Arc;

use auth::domain::repository::{RoleRepository, UserCache, UserRepository};
use auth::middleware::{admission_control, require_basic_auth};
use auth::{AuthAppState, auth_router};
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware, routing::get};
use feed::domain::repository::PostRepository;
use feed::{FeedAppState, FeedConfig, feed_router};
use notify::Notifier;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::health::{HealthInfo, health};

pub fn app<R, C, N, P>(
    auth_state: AuthAppState<R, C, N>,
    posts: Arc<P>,
    feed_config: FeedConfig,
    health_info: HealthInfo,
) -> Router
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    P: PostRepository + Send + Sync + 'static,
{
    let guard = auth_state.guard.clone();
    let feed_state = FeedAppState::new(posts, guard.clone(), feed_config);

    let health_routes = Router::new()
        .route("/", get(health))
        .route_layer(middleware::from_fn_with_state(
            guard.clone(),
            require_basic_auth::<R, C>,
        ))
        .with_state(health_info);

    Router::new()
        .nest("/v1/auth", auth_router(auth_state))
        .nest("/v1/posts", feed_router(feed_state))
        .nest("/v1/health", health_routes)
        .layer(middleware::from_fn_with_state(
            guard,
            admission_control::<R, C>,
        ))
}

/// CORS for the browser frontend; the session cookie needs credentials
pub fn cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}

/// Full middleware stack around [`app`]
pub fn with_layers(app: Router, origins: &[String]) -> Router {
    app.layer(TraceLayer::new_for_http()).layer(cors(origins))
}
