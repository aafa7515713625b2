//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::basic_auth::BasicAuthConfig;
use platform::cookie::CookieConfig;
use platform::crypto::random_bytes;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: Vec<u8>,
    pub token_issuer: String,
    pub token_audience: String,
    pub token_expiry: Duration,
    /// Session cookie carrying the token
    pub cookie: CookieConfig,
    /// Operator credentials for Basic-guarded routes
    pub basic_auth: BasicAuthConfig,
    /// Lifetime of an activation invitation
    pub invitation_ttl: Duration,
    /// Lifetime of a cached user snapshot
    pub user_cache_ttl: Duration,
    /// Deadline for publishing the invitation
    pub publish_deadline: Duration,
    /// Deadline for the compensating delete after a failed publish
    pub compensation_deadline: Duration,
    /// Host (and optional port) of the frontend serving `/activate`
    pub frontend_url: String,
    /// `https` in production
    pub frontend_scheme: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let token_expiry = Duration::from_secs(3 * 24 * 3600); // 3 days
        Self {
            jwt_secret: Vec::new(),
            token_issuer: "feed".to_string(),
            token_audience: "feed".to_string(),
            token_expiry,
            cookie: CookieConfig::default().with_max_age(token_expiry.as_secs() as i64),
            basic_auth: BasicAuthConfig::new("admin", ""),
            invitation_ttl: Duration::from_secs(24 * 3600),
            user_cache_ttl: Duration::from_secs(3600),
            publish_deadline: Duration::from_secs(3),
            compensation_deadline: Duration::from_secs(5),
            frontend_url: "localhost:5173".to_string(),
            frontend_scheme: "https".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development (plain HTTP cookie and links)
    pub fn development() -> Self {
        let base = Self::with_random_secret();
        Self {
            cookie: CookieConfig::development().with_max_age(base.token_expiry.as_secs() as i64),
            frontend_scheme: "http".to_string(),
            ..base
        }
    }

    /// Link embedded in the invitation email
    pub fn activation_url(&self, plaintext_token: &str) -> String {
        format!(
            "{}://{}/activate?token={}",
            self.frontend_scheme, self.frontend_url, plaintext_token
        )
    }

    pub fn invitation_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.invitation_ttl).unwrap_or(chrono::Duration::hours(24))
    }
}
