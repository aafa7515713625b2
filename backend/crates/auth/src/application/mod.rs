//! Application Layer
//!
//! Use cases and application services.

pub mod activate;
pub mod authorization;
pub mod config;
pub mod register;
pub mod sign_in;
pub mod token;
pub mod user_lookup;

// Re-exports
pub use activate::ActivateUseCase;
pub use authorization::{AccessRequirement, AuthorizationChain, Authorized, ChainState};
pub use config::AuthConfig;
pub use register::{PendingRegistration, RegisterInput, RegistrationSaga};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use token::{Claims, JwtAuthenticator, TokenAuthenticator, TokenError, TokenMetadata};
pub use user_lookup::{LookupOrigin, Resolution, UserLookup};
