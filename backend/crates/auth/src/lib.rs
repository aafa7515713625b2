//! Auth (Authentication and Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, the access decision table, repository traits
//! - `application/` - Token authenticator, user lookup, authorization chain, use cases
//! - `infra/` - Postgres repository, in-memory store and cache
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Request pipeline
//! 1. Admission control (fixed-window rate limit per client)
//! 2. Session token from the `jwt` cookie (HS256 only, exp/iss/aud checked)
//! 3. Principal resolved through the read-through user cache
//! 4. Role level or resource ownership, checked by the handler
//!
//! ## Registration
//! User and invitation are committed together; the activation email is
//! published afterwards and a failed publish rolls the user back.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::{AccessRequirement, AuthorizationChain};
pub use domain::{AccessGrant, Principal, Role};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryUserRepository, MemoryUserCache, PgAuthRepository};
pub use presentation::{AuthAppState, AuthGuard, auth_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
