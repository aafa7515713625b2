//! Server Configuration
//!
//! Read once at startup from the process environment (after `.env`).
//! Unset variables fall back to development-friendly defaults, except
//! `DATABASE_URL`, plus `JWT_SECRET` and `BASIC_AUTH_PASSWORD` outside
//! development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use notify::MailerConfig;
use platform::basic_auth::BasicAuthConfig;
use platform::rate_limit::RateLimitConfig;

const DEVELOPMENT: &str = "development";

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub max_idle_time: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub env: String,
    pub frontend_origins: Vec<String>,
    pub db: DbConfig,
    pub cache_enabled: bool,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    /// `None` sends nothing and logs each email instead
    pub mailer: Option<MailerConfig>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = var("ENV").unwrap_or_else(|| DEVELOPMENT.to_string());
        let is_dev = env == DEVELOPMENT;

        let addr = parse_or(&var, "ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let frontend_url = var("FRONTEND_URL").unwrap_or_else(|| "localhost:5173".to_string());

        let db = DbConfig {
            url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_open_conns: parse_or(&var, "DB_MAX_OPEN_CONNS", 30)?,
            max_idle_conns: parse_or(&var, "DB_MAX_IDLE_CONNS", 30)?,
            max_idle_time: Duration::from_secs(parse_or(&var, "DB_MAX_IDLE_TIME_SECS", 15 * 60)?),
        };

        let mut auth = if is_dev {
            AuthConfig::development()
        } else {
            AuthConfig::default()
        };
        match var("JWT_SECRET") {
            Some(secret) => auth.jwt_secret = secret.into_bytes(),
            None if is_dev => {}
            None => bail!("JWT_SECRET must be set outside development"),
        }
        if let Some(issuer) = var("JWT_ISSUER") {
            auth.token_issuer = issuer;
        }
        if let Some(audience) = var("JWT_AUDIENCE") {
            auth.token_audience = audience;
        }
        auth.token_expiry = Duration::from_secs(parse_or(
            &var,
            "JWT_EXPIRY_SECS",
            auth.token_expiry.as_secs(),
        )?);
        auth.cookie = auth.cookie.with_max_age(auth.token_expiry.as_secs() as i64);
        // Unset in development leaves the operational routes locked
        let basic_password = match var("BASIC_AUTH_PASSWORD") {
            Some(password) => password,
            None if is_dev => String::new(),
            None => bail!("BASIC_AUTH_PASSWORD must be set outside development"),
        };
        auth.basic_auth = BasicAuthConfig::new(
            var("BASIC_AUTH_USERNAME").unwrap_or_else(|| "admin".to_string()),
            basic_password,
        );
        auth.frontend_url = frontend_url.clone();

        let rate_limit = RateLimitConfig {
            enabled: parse_or(&var, "RATELIMITER_ENABLED", true)?,
            ..RateLimitConfig::new(
                parse_or(&var, "RATELIMITER_REQUESTS_COUNT", 20)?,
                parse_or(&var, "RATELIMITER_WINDOW_SECS", 5)?,
            )
        };

        let mailer = match (var("MAIL_API_URL"), var("MAIL_API_TOKEN")) {
            (Some(api_url), Some(api_token)) => Some(MailerConfig {
                api_url,
                api_token,
                from_email: var("MAIL_FROM").unwrap_or_else(|| MailerConfig::default().from_email),
                ..MailerConfig::default()
            }),
            _ => None,
        };

        let frontend_origins = var("FRONTEND_ORIGINS")
            .map(|list| list.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|| vec![format!("{}://{}", auth.frontend_scheme, frontend_url)]);

        Ok(Self {
            addr,
            env,
            frontend_origins,
            db,
            cache_enabled: parse_or(&var, "CACHE_ENABLED", true)?,
            auth,
            rate_limit,
            mailer,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
