//! Auth Middleware
//!
//! The request-facing steps of the authorization chain:
//! - `admission_control` - rate limit every request by client key
//! - `require_session` - resolve the `jwt` cookie to a [`Principal`]
//! - `require_basic_auth` - operator credentials for operational routes
//!
//! Role and ownership checks happen in handlers, once the target resource
//! is loaded.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::client_key;
use platform::cookie::extract_cookie;

use crate::application::authorization::AuthorizationChain;
use crate::domain::entity::user::Principal;
use crate::domain::repository::{RoleRepository, UserCache, UserRepository};
use crate::error::AuthError;

/// State shared by the auth middleware
pub struct AuthGuard<R, C> {
    pub chain: Arc<AuthorizationChain<R, C>>,
    pub cookie_name: Arc<str>,
}

impl<R, C> Clone for AuthGuard<R, C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            cookie_name: Arc::clone(&self.cookie_name),
        }
    }
}

impl<R, C> AuthGuard<R, C> {
    pub fn new(chain: Arc<AuthorizationChain<R, C>>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            chain,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Reject clients over their request budget with 429
pub async fn admission_control<R, C>(
    State(guard): State<AuthGuard<R, C>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(req.headers(), peer);

    guard.chain.admit(&key)?;
    Ok(next.run(req).await)
}

/// Require a valid session; the resolved [`Principal`] is added to the
/// request extensions
pub async fn require_session<R, C>(
    State(guard): State<AuthGuard<R, C>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    let token = extract_cookie(req.headers(), &guard.cookie_name);
    let principal: Principal = guard.chain.authenticate(token.as_deref()).await?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Require Basic credentials; failures carry a `WWW-Authenticate` challenge
pub async fn require_basic_auth<R, C>(
    State(guard): State<AuthGuard<R, C>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
{
    guard.chain.authenticate_basic(req.headers())?;
    Ok(next.run(req).await)
}
