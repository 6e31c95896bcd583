use anyhow::Result;
use std::env;

/// Session-token settings. Built once at startup and handed to handlers and
/// middleware via an `Extension` layer; rotating `JWT_SECRET` invalidates
/// every outstanding session token.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds; the session cookie uses the same value
    /// for its Max-Age.
    pub token_expiry: u64,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

const DEFAULT_TOKEN_EXPIRY: u64 = 7 * 24 * 60 * 60; // 7 days

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let token_expiry = env::var("JWT_EXPIRY_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .ok()
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Some(true),
                "0" | "false" | "no" | "n" | "off" => Some(false),
                _ => None,
            })
            .unwrap_or(true);

        Ok(Self {
            secret,
            token_expiry,
            cookie_secure,
        })
    }
}
