//! Token Authenticator
//!
//! Stateless signed session tokens. Validation pins the algorithm to an
//! allow-list of one (HS256), so a token whose header names any other
//! algorithm, `none` included, is rejected before its signature is looked
//! at. Expiry is the only revocation.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::config::AuthConfig;

/// Registered claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// Claims for `user_id`, valid from `now` for the configured expiry
    pub fn for_user(user_id: &UserId, metadata: &TokenMetadata, now: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: now + metadata.expiry.as_secs() as i64,
            iat: now,
            nbf: now,
            iss: metadata.issuer.clone(),
            aud: metadata.audience.clone(),
        }
    }

    pub fn subject(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub expiry: Duration,
    pub issuer: String,
    pub audience: String,
}

/// Token failure. The variant payload is for logs only.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Rejected(jsonwebtoken::errors::Error),
}

impl TokenError {
    pub fn cause(&self) -> &jsonwebtoken::errors::ErrorKind {
        match self {
            TokenError::Signing(e) | TokenError::Rejected(e) => e.kind(),
        }
    }
}

pub trait TokenAuthenticator: Send + Sync {
    fn generate_token(&self, claims: &Claims) -> Result<String, TokenError>;

    fn validate_token(&self, token: &str) -> Result<Claims, TokenError>;

    fn metadata(&self) -> &TokenMetadata;

    /// Issue a token for `user_id` starting now
    fn issue_for(&self, user_id: &UserId) -> Result<String, TokenError> {
        let claims = Claims::for_user(user_id, self.metadata(), Utc::now().timestamp());
        self.generate_token(&claims)
    }
}

/// HS256 JWT authenticator
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    metadata: TokenMetadata,
}

impl JwtAuthenticator {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(secret: &[u8], metadata: TokenMetadata) -> Self {
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[metadata.issuer.as_str()]);
        validation.set_audience(&[metadata.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            metadata,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            TokenMetadata {
                expiry: config.token_expiry,
                issuer: config.token_issuer.clone(),
                audience: config.token_audience.clone(),
            },
        )
    }
}

impl TokenAuthenticator for JwtAuthenticator {
    fn generate_token(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Self::ALGORITHM), claims, &self.encoding).map_err(TokenError::Signing)
    }

    fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Rejected)
    }

    fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }
}
