use serde::Deserialize;
use std::env;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub assets: AssetHostConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

/// Signing material for both token kinds. Two independent secrets so that
/// compromise of one kind cannot forge the other.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,

    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,

    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetHostConfig {
    /// Upload endpoint of the external binary-asset host.
    pub upload_url: String,

    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins. "*" allows any origin
    /// (NOT recommended for production).
    pub allowed_origins: String,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_access_token_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_ttl() -> i64 {
    604800 // 7 days
}

const MIN_SECRET_LEN: usize = 32;

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{} must be set", name)))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| default_app_env()),
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: parsed_or("APP_PORT", default_app_port()),
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", default_db_max_connections()),
        };

        let auth = AuthConfig {
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            access_token_ttl_secs: parsed_or("ACCESS_TOKEN_TTL_SECS", default_access_token_ttl()),
            refresh_token_ttl_secs: parsed_or(
                "REFRESH_TOKEN_TTL_SECS",
                default_refresh_token_ttl(),
            ),
        };

        let assets = AssetHostConfig {
            upload_url: required("ASSET_HOST_UPLOAD_URL")?,
            api_key: env::var("ASSET_HOST_API_KEY").unwrap_or_default(),
        };

        let cors = CorsConfig {
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        let config = Config {
            app,
            database,
            auth,
            assets,
            cors,
        };
        config.validate()?;
        Ok(config)
    }

    /// Startup validation of the signing material. A bad secret must abort
    /// before the server binds, not surface on the first request.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate()
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.env == "development"
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.access_token_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Configuration(format!(
                "ACCESS_TOKEN_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if self.refresh_token_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Configuration(format!(
                "REFRESH_TOKEN_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(AppError::Configuration(
                "access and refresh token secrets must differ".to_string(),
            ));
        }
        if self.access_token_ttl_secs <= 0 || self.refresh_token_ttl_secs <= 0 {
            return Err(AppError::Configuration(
                "token TTLs must be positive".to_string(),
            ));
        }
        if self.access_token_ttl_secs >= self.refresh_token_ttl_secs {
            return Err(AppError::Configuration(
                "refresh token TTL must exceed access token TTL".to_string(),
            ));
        }
        Ok(())
    }
}
