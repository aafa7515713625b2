//! Authorization Chain
//!
//! Per-request state machine:
//!
//! ```text
//! Unauthenticated ──admit──▶ (RateLimited: 429)
//!        │
//!        ├─credential, token, principal──▶ (401)
//!        ▼
//!  Authenticated ──role / ownership──▶ (RoleChecked: 403)
//!        │
//!        ▼
//!    Authorized
//! ```
//!
//! Each step is also callable on its own, so the HTTP layer can admit every
//! request, authenticate session routes, and authorize inside handlers once
//! the target resource (and its owner) is known.

use std::cmp::Ordering;
use std::sync::Arc;

use axum::http::HeaderMap;
use kernel::id::UserId;
use platform::basic_auth::BasicAuthConfig;
use platform::rate_limit::RateLimiter;

use crate::application::token::TokenAuthenticator;
use crate::application::user_lookup::{Resolution, UserLookup};
use crate::domain::entity::role::Role;
use crate::domain::entity::user::Principal;
use crate::domain::policy::{AccessDecision, AccessGrant, decide};
use crate::domain::repository::{RoleRepository, UserCache, UserRepository};
use crate::error::{AuthError, AuthResult, UnauthenticatedReason};

/// Terminal and intermediate states of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Unauthenticated,
    RateLimited,
    Authenticated,
    RoleChecked,
    Authorized,
}

impl ChainState {
    /// State in which a failed request stopped
    pub fn of_error(err: &AuthError) -> Self {
        match err {
            AuthError::AdmissionDenied { .. } => ChainState::RateLimited,
            AuthError::Forbidden => ChainState::RoleChecked,
            _ => ChainState::Unauthenticated,
        }
    }
}

/// What an operation demands of its caller
#[derive(Debug, Clone, Copy)]
pub struct AccessRequirement<'a> {
    /// Name of the least role allowed
    pub required_role: &'a str,
    /// Owner of the target resource, if it has one
    pub owner: Option<UserId>,
}

impl<'a> AccessRequirement<'a> {
    pub fn role(required_role: &'a str) -> Self {
        Self {
            required_role,
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Outcome of a complete chain run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized {
    pub principal: Principal,
    /// `None` when no requirement was checked
    pub grant: Option<AccessGrant>,
}

pub struct AuthorizationChain<R, C> {
    limiter: Arc<dyn RateLimiter>,
    tokens: Arc<dyn TokenAuthenticator>,
    lookup: UserLookup<R, C>,
    roles: Arc<R>,
    basic: BasicAuthConfig,
}

impl<R, C> AuthorizationChain<R, C>
where
    R: UserRepository + RoleRepository,
    C: UserCache,
{
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        tokens: Arc<dyn TokenAuthenticator>,
        lookup: UserLookup<R, C>,
        roles: Arc<R>,
        basic: BasicAuthConfig,
    ) -> Self {
        Self {
            limiter,
            tokens,
            lookup,
            roles,
            basic,
        }
    }

    /// Run every step in order
    pub async fn run(
        &self,
        client_key: &str,
        token: Option<&str>,
        requirement: Option<&AccessRequirement<'_>>,
    ) -> AuthResult<Authorized> {
        self.admit(client_key)?;
        let principal = self.authenticate(token).await?;
        let grant = match requirement {
            Some(requirement) => Some(self.authorize(&principal, requirement).await?),
            None => None,
        };

        tracing::trace!(
            user_id = %principal.id,
            state = ?ChainState::Authorized,
            "request authorized"
        );
        Ok(Authorized { principal, grant })
    }

    /// Admission control on the client key
    pub fn admit(&self, client_key: &str) -> AuthResult<()> {
        let decision = self.limiter.allow(client_key);
        if decision.admitted {
            return Ok(());
        }

        tracing::warn!(
            client = %client_key,
            retry_after_secs = decision.retry_after.as_secs(),
            "rate limit exceeded"
        );
        Err(AuthError::AdmissionDenied {
            retry_after: decision.retry_after,
        })
    }

    /// Resolve the session token to an active principal
    pub async fn authenticate(&self, token: Option<&str>) -> AuthResult<Principal> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential))?;

        let claims = self
            .tokens
            .validate_token(token)
            .map_err(|e| AuthError::Unauthenticated(UnauthenticatedReason::Token(e)))?;

        let user_id = claims
            .subject()
            .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::MalformedSubject))?;

        match self.lookup.resolve(&user_id).await {
            Ok(Resolution::Found { user, .. }) => Ok(user.principal()),
            Ok(Resolution::NotFound) => Err(AuthError::Unauthenticated(
                UnauthenticatedReason::UnknownPrincipal,
            )),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "principal lookup failed");
                Err(AuthError::Unauthenticated(UnauthenticatedReason::LookupFailed(
                    e.to_string(),
                )))
            }
        }
    }

    /// Operator credentials for operational endpoints
    pub fn authenticate_basic(&self, headers: &HeaderMap) -> AuthResult<()> {
        self.basic.authenticate(headers).map_err(AuthError::from)
    }

    /// Ownership first, then role level
    pub async fn authorize(
        &self,
        principal: &Principal,
        requirement: &AccessRequirement<'_>,
    ) -> AuthResult<AccessGrant> {
        let owner_match = requirement.owner == Some(principal.id);

        // Owners skip the role lookup; the ordering is ignored for them
        let level_cmp = if owner_match {
            Ordering::Equal
        } else {
            self.compare_level(principal, requirement.required_role)
                .await?
        };

        match decide(owner_match, level_cmp) {
            AccessDecision::Allow(grant) => Ok(grant),
            AccessDecision::Deny => {
                tracing::debug!(
                    user_id = %principal.id,
                    required_role = requirement.required_role,
                    "access denied"
                );
                Err(AuthError::Forbidden)
            }
        }
    }

    async fn compare_level(
        &self,
        principal: &Principal,
        required_role: &str,
    ) -> AuthResult<Ordering> {
        let held = self
            .roles
            .find_role_by_id(principal.role_id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("unknown role id {}", principal.role_id)))?;
        let required = self.required_role(required_role).await?;

        Ok(held.level.cmp(&required.level))
    }

    async fn required_role(&self, name: &str) -> AuthResult<Role> {
        self.roles
            .find_role_by_name(name)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("unknown role {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::http::header;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use platform::rate_limit::RateLimitConfig;

    use crate::application::token::{JwtAuthenticator, TokenMetadata};
    use crate::domain::entity::role::RoleId;
    use crate::infra::{cache::MemoryUserCache, memory::InMemoryUserRepository};
    use crate::testing::{active_with_role, user};

    type Chain = AuthorizationChain<InMemoryUserRepository, MemoryUserCache>;

    fn tokens() -> Arc<JwtAuthenticator> {
        Arc::new(JwtAuthenticator::new(
            b"chain-test-secret-chain-test-sec",
            TokenMetadata {
                expiry: Duration::from_secs(600),
                issuer: "feed".into(),
                audience: "feed".into(),
            },
        ))
    }

    fn chain_with(
        store: &InMemoryUserRepository,
        limit: RateLimitConfig,
    ) -> (Chain, Arc<JwtAuthenticator>) {
        let tokens = tokens();
        let store = Arc::new(store.clone());
        let lookup = UserLookup::new(
            Arc::clone(&store),
            Arc::new(MemoryUserCache::new()),
            Duration::from_secs(3600),
        );
        let chain = AuthorizationChain::new(
            limit.build(),
            tokens.clone(),
            lookup,
            store,
            BasicAuthConfig::new("ops", "s3cret"),
        );
        (chain, tokens)
    }

    fn chain(store: &InMemoryUserRepository) -> (Chain, Arc<JwtAuthenticator>) {
        chain_with(store, RateLimitConfig::disabled())
    }

    #[tokio::test]
    async fn authorized_request_runs_to_completion() {
        let store = InMemoryUserRepository::new();
        let u = active_with_role("mod", RoleId::MODERATOR);
        store.insert(u.clone()).unwrap();
        let (chain, tokens) = chain(&store);
        let token = tokens.issue_for(&u.user_id).unwrap();

        let out = chain
            .run("10.0.0.1", Some(&token), Some(&AccessRequirement::role(Role::MODERATOR)))
            .await
            .unwrap();
        assert_eq!(out.principal.id, u.user_id);
        assert_eq!(out.grant, Some(AccessGrant::Role));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_before_credentials_are_read() {
        let store = InMemoryUserRepository::new();
        let (chain, _) = chain_with(&store, RateLimitConfig::new(1, 1));

        // First request spends the quota even though it fails authentication
        let err = chain.run("10.0.0.2", None, None).await.unwrap_err();
        assert_eq!(ChainState::of_error(&err), ChainState::Unauthenticated);

        let err = chain.run("10.0.0.2", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::AdmissionDenied { retry_after } if retry_after == Duration::from_secs(1)
        ));
        assert_eq!(ChainState::of_error(&err), ChainState::RateLimited);
    }

    #[tokio::test]
    async fn missing_and_invalid_tokens_are_unauthenticated() {
        let store = InMemoryUserRepository::new();
        let (chain, _) = chain(&store);

        assert!(matches!(
            chain.authenticate(None).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential))
        ));
        assert!(matches!(
            chain.authenticate(Some("")).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential))
        ));
        assert!(matches!(
            chain.authenticate(Some("abc.def.ghi")).await,
            Err(AuthError::Unauthenticated(UnauthenticatedReason::Token(_)))
        ));
    }

    #[tokio::test]
    async fn vanished_principal_is_unauthenticated() {
        let store = InMemoryUserRepository::new();
        let (chain, tokens) = chain(&store);

        let deleted = tokens.issue_for(&UserId::new()).unwrap();
        let err = chain.authenticate(Some(&deleted)).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unauthenticated(UnauthenticatedReason::UnknownPrincipal)
        ));
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[tokio::test]
    async fn unactivated_principal_is_unauthenticated() {
        let store = InMemoryUserRepository::new();
        let u = user("pending", "pending@example.com");
        store.insert(u.clone()).unwrap();
        let (chain, tokens) = chain(&store);

        let token = tokens.issue_for(&u.user_id).unwrap();
        assert!(chain.authenticate(Some(&token)).await.is_err());
    }

    #[tokio::test]
    async fn owner_bypasses_role_check() {
        let store = InMemoryUserRepository::new();
        let owner = active_with_role("owner", RoleId::USER);
        store.insert(owner.clone()).unwrap();
        let (chain, _) = chain(&store);

        let requirement = AccessRequirement::role(Role::ADMIN).owned_by(owner.user_id);
        let grant = chain.authorize(&owner.principal(), &requirement).await.unwrap();
        assert_eq!(grant, AccessGrant::Owner);
    }

    #[tokio::test]
    async fn non_owner_below_required_level_is_forbidden() {
        let store = InMemoryUserRepository::new();
        let (chain, _) = chain(&store);
        let moderator = active_with_role("moderator", RoleId::MODERATOR);

        let requirement = AccessRequirement::role(Role::ADMIN).owned_by(UserId::new());
        let err = chain.authorize(&moderator.principal(), &requirement).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
        assert_eq!(ChainState::of_error(&err), ChainState::RoleChecked);
        assert_eq!(err.status_code().as_u16(), 403);

        let requirement = AccessRequirement::role(Role::MODERATOR).owned_by(UserId::new());
        assert_eq!(
            chain.authorize(&moderator.principal(), &requirement).await.unwrap(),
            AccessGrant::Role
        );
    }

    #[tokio::test]
    async fn unknown_required_role_is_internal() {
        let store = InMemoryUserRepository::new();
        let (chain, _) = chain(&store);
        let admin = active_with_role("admin", RoleId::ADMIN);

        let err = chain
            .authorize(&admin.principal(), &AccessRequirement::role("superuser"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn basic_credentials_are_checked() {
        let store = InMemoryUserRepository::new();
        let (chain, _) = chain(&store);

        let mut headers = HeaderMap::new();
        assert!(matches!(
            chain.authenticate_basic(&headers),
            Err(AuthError::BasicAuthRequired(_))
        ));

        let value = format!("Basic {}", STANDARD.encode("ops:s3cret"));
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        assert!(chain.authenticate_basic(&headers).is_ok());

        let value = format!("Basic {}", STANDARD.encode("ops:wrong"));
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        assert!(chain.authenticate_basic(&headers).is_err());
    }
}
