/// Configuration management for Forum Service
///
/// Everything the process needs at runtime (bind address, store backend, JWT
/// secret, upload directory) is read once here and passed down explicitly.
use db_pool::env_utils::{env_or, parse_env_with_default};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEV_JWT_SECRET: &str = "forum-development-secret-do-not-use-in-prod";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Which store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown STORE_BACKEND '{}'", other)),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
}

/// Token issuance configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_days", &self.jwt_expiry_days)
            .finish()
    }
}

/// Attachment upload limits and location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: usize,
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            max_file_bytes: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig {
            env: env_or("APP_ENV", "development"),
            host: env_or("FORUM_HOST", "0.0.0.0"),
            port: parse_env_with_default("FORUM_PORT", 5000),
        };
        let production = app.is_production();

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:5173,http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let store = StoreConfig {
            backend: env_or("STORE_BACKEND", "postgres").parse()?,
            database_url: env_or("DATABASE_URL", "postgresql://localhost/forum"),
            max_connections: parse_env_with_default("DATABASE_MAX_CONNECTIONS", 10),
        };

        let auth = {
            let jwt_secret = match std::env::var("JWT_SECRET") {
                Ok(secret) if production && secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_LEN
                    ))
                }
                Ok(secret) => secret,
                Err(_) if production => {
                    return Err("JWT_SECRET must be set in production".to_string())
                }
                Err(_) => {
                    tracing::warn!("JWT_SECRET not set, using development secret");
                    DEV_JWT_SECRET.to_string()
                }
            };

            AuthConfig {
                jwt_secret,
                jwt_expiry_days: parse_env_with_default(
                    "JWT_EXPIRY_DAYS",
                    crypto_core::jwt::DEFAULT_EXPIRY_DAYS,
                ),
            }
        };

        let defaults = UploadConfig::default();
        let uploads = UploadConfig {
            dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            max_file_bytes: parse_env_with_default("UPLOAD_MAX_FILE_BYTES", defaults.max_file_bytes),
            max_files: parse_env_with_default("UPLOAD_MAX_FILES", defaults.max_files),
        };

        Ok(Config {
            app,
            cors,
            store,
            auth,
            uploads,
        })
    }
}
