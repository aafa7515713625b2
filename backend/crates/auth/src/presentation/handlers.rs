//! HTTP Handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use notify::Notifier;
use platform::rate_limit::RateLimiter;

use crate::application::{
    ActivateUseCase, AuthConfig, AuthorizationChain, JwtAuthenticator, RegisterInput,
    RegistrationSaga, SignInInput, SignInUseCase, TokenAuthenticator, UserLookup,
};
use crate::domain::entity::user::Principal;
use crate::domain::repository::{RoleRepository, UserCache, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ActivateRequest, LoginRequest, LoginResponse, PrincipalResponse, RegisterRequest, UserResponse,
};
use crate::presentation::middleware::AuthGuard;

/// Shared state for auth handlers
pub struct AuthAppState<R, C, N> {
    pub guard: AuthGuard<R, C>,
    pub registration: Arc<RegistrationSaga<R, N>>,
    pub activation: Arc<ActivateUseCase<R, C>>,
    pub sign_in: Arc<SignInUseCase<R>>,
    pub config: Arc<AuthConfig>,
}

impl<R, C, N> Clone for AuthAppState<R, C, N> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            registration: Arc::clone(&self.registration),
            activation: Arc::clone(&self.activation),
            sign_in: Arc::clone(&self.sign_in),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R, C, N> AuthAppState<R, C, N>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    /// Wire every auth component over one store, cache and notifier
    pub fn new(
        repo: Arc<R>,
        cache: Arc<C>,
        notifier: Arc<N>,
        limiter: Arc<dyn RateLimiter>,
        config: AuthConfig,
    ) -> Self {
        let config = Arc::new(config);
        let tokens: Arc<dyn TokenAuthenticator> = Arc::new(JwtAuthenticator::from_config(&config));
        let lookup = UserLookup::new(Arc::clone(&repo), cache, config.user_cache_ttl);

        let chain = Arc::new(AuthorizationChain::new(
            limiter,
            Arc::clone(&tokens),
            lookup.clone(),
            Arc::clone(&repo),
            config.basic_auth.clone(),
        ));

        Self {
            guard: AuthGuard::new(chain, config.cookie.name.as_str()),
            registration: Arc::new(RegistrationSaga::new(
                Arc::clone(&repo),
                notifier,
                Arc::clone(&config),
            )),
            activation: Arc::new(ActivateUseCase::new(Arc::clone(&repo), lookup)),
            sign_in: Arc::new(SignInUseCase::new(repo, tokens)),
            config,
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /v1/auth/register
pub async fn register<R, C, N>(
    State(state): State<AuthAppState<R, C, N>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let input = RegisterInput {
        user_name: req.username,
        email: req.email,
        password: req.password,
    };

    let user = state.registration.execute(input).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

// ============================================================================
// Activate
// ============================================================================

/// POST /v1/auth/activate
pub async fn activate<R, C, N>(
    State(state): State<AuthAppState<R, C, N>>,
    Json(req): Json<ActivateRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    state.activation.execute(&req.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /v1/auth/login
pub async fn login<R, C, N>(
    State(state): State<AuthAppState<R, C, N>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Response>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let output = state
        .sign_in
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookie = state
        .config
        .cookie
        .set_header(&output.token)
        .ok_or_else(|| AuthError::Internal("session cookie is not a valid header".to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user_id: output.user_id,
            expires_in: output.expires_in.as_secs(),
        }),
    )
        .into_response())
}

/// POST /v1/auth/logout
///
/// Clears the cookie only; the token itself stays valid until it expires.
pub async fn logout<R, C, N>(State(state): State<AuthAppState<R, C, N>>) -> AuthResult<Response>
where
    R: UserRepository + RoleRepository + Send + Sync + 'static,
    C: UserCache + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let cookie = state
        .config
        .cookie
        .delete_header()
        .ok_or_else(|| AuthError::Internal("session cookie is not a valid header".to_string()))?;

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

/// GET /v1/auth/me
pub async fn me(Extension(principal): Extension<Principal>) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        id: principal.id,
        role_id: principal.role_id.id(),
    })
}
