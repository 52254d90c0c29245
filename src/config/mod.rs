use std::env;

/// Runtime configuration for the API server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JWT secret key used to validate bearer tokens (Required)
    pub jwt_secret: String,

    /// Deployment environment: "development" or "production"
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),
            environment: env::var("APP_ENV").unwrap_or(default.environment),
        }
    }
}

/// Error bodies carry a `stack` field only outside production.
pub fn is_production() -> bool {
    env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}
